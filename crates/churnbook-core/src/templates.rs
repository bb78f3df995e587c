//! Fixed report definitions.
//!
//! Everything here is authored once and never mutated: the sheet names, the
//! raw columns the formulas read, the category lists of the breakdown
//! sheets, the tenure buckets, the service columns and the retention
//! scenarios.

/// Worksheet names, in workbook order
pub mod sheets {
    pub const DASHBOARD: &str = "Dashboard";
    pub const CHURN_BY_CONTRACT: &str = "Churn_by_Contract";
    pub const CHURN_BY_PAYMENT: &str = "Churn_by_Payment";
    pub const CHURN_BY_TENURE: &str = "Churn_by_Tenure";
    pub const SERVICE_IMPACT: &str = "Service_Impact";
    pub const REVENUE_ANALYSIS: &str = "Revenue_Analysis";
    pub const RAW_DATA: &str = "Raw_Data";

    pub const ALL: [&str; 7] = [
        DASHBOARD,
        CHURN_BY_CONTRACT,
        CHURN_BY_PAYMENT,
        CHURN_BY_TENURE,
        SERVICE_IMPACT,
        REVENUE_ANALYSIS,
        RAW_DATA,
    ];
}

/// Raw table header names referenced by formulas
pub mod columns {
    pub const CUSTOMER_ID: &str = "customerID";
    pub const TENURE: &str = "tenure";
    pub const ONLINE_SECURITY: &str = "OnlineSecurity";
    pub const ONLINE_BACKUP: &str = "OnlineBackup";
    pub const DEVICE_PROTECTION: &str = "DeviceProtection";
    pub const TECH_SUPPORT: &str = "TechSupport";
    pub const STREAMING_TV: &str = "StreamingTV";
    pub const CONTRACT: &str = "Contract";
    pub const PAYMENT_METHOD: &str = "PaymentMethod";
    pub const MONTHLY_CHARGES: &str = "MonthlyCharges";
    pub const CHURN: &str = "Churn";

    pub const REQUIRED: &[&str] = &[
        CUSTOMER_ID,
        TENURE,
        ONLINE_SECURITY,
        ONLINE_BACKUP,
        DEVICE_PROTECTION,
        TECH_SUPPORT,
        STREAMING_TV,
        CONTRACT,
        PAYMENT_METHOD,
        MONTHLY_CHARGES,
        CHURN,
    ];
}

/// Churn label of a churned customer
pub const CHURNED: &str = "Yes";
/// Churn label of a retained customer
pub const RETAINED: &str = "No";
/// Service flag value meaning subscribed
pub const HAS_SERVICE: &str = "Yes";
/// Service flag value meaning not subscribed
pub const NO_SERVICE: &str = "No";
/// Monthly figures are annualized with this factor
pub const MONTHS_PER_YEAR: u32 = 12;

// ============================================================================
// Categorical breakdowns
// ============================================================================

/// Chart attached to a breakdown table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChartSpec {
    pub title: &'static str,
    pub y_axis: &'static str,
    pub x_axis: Option<&'static str>,
    /// Size in pixels
    pub width: u32,
    pub height: u32,
}

/// A count/churn/revenue table over a fixed list of category values
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoricalBreakdown {
    pub sheet: &'static str,
    pub title: &'static str,
    pub category_header: &'static str,
    /// Raw column holding the category value
    pub column: &'static str,
    pub categories: &'static [&'static str],
    pub chart: Option<ChartSpec>,
}

pub const CONTRACT_TYPES: &[&str] = &["Month-to-month", "One year", "Two year"];

pub const PAYMENT_METHODS: &[&str] = &[
    "Electronic check",
    "Mailed check",
    "Bank transfer (automatic)",
    "Credit card (automatic)",
];

pub const CONTRACT_BREAKDOWN: CategoricalBreakdown = CategoricalBreakdown {
    sheet: sheets::CHURN_BY_CONTRACT,
    title: "CHURN ANALYSIS BY CONTRACT TYPE",
    category_header: "Contract Type",
    column: columns::CONTRACT,
    categories: CONTRACT_TYPES,
    chart: Some(ChartSpec {
        title: "Churn Rate by Contract Type",
        y_axis: "Churn Rate",
        x_axis: None,
        width: 454,
        height: 302,
    }),
};

pub const PAYMENT_BREAKDOWN: CategoricalBreakdown = CategoricalBreakdown {
    sheet: sheets::CHURN_BY_PAYMENT,
    title: "CHURN ANALYSIS BY PAYMENT METHOD",
    category_header: "Payment Method",
    column: columns::PAYMENT_METHOD,
    categories: PAYMENT_METHODS,
    chart: None,
};

// ============================================================================
// Tenure
// ============================================================================

/// Inclusive month range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TenureBucket {
    pub label: &'static str,
    pub min_months: u32,
    pub max_months: u32,
}

impl TenureBucket {
    pub const fn contains(&self, months: u32) -> bool {
        months >= self.min_months && months <= self.max_months
    }
}

pub const TENURE_BUCKETS: &[TenureBucket] = &[
    TenureBucket { label: "0-12 months", min_months: 0, max_months: 12 },
    TenureBucket { label: "13-24 months", min_months: 13, max_months: 24 },
    TenureBucket { label: "25-36 months", min_months: 25, max_months: 36 },
    TenureBucket { label: "37-48 months", min_months: 37, max_months: 48 },
    TenureBucket { label: "49-60 months", min_months: 49, max_months: 60 },
    TenureBucket { label: "61-72 months", min_months: 61, max_months: 72 },
];

pub const TENURE_CHART: ChartSpec = ChartSpec {
    title: "Churn Rate by Tenure",
    y_axis: "Churn Rate",
    x_axis: Some("Tenure Bucket"),
    width: 529,
    height: 302,
};

// ============================================================================
// Services
// ============================================================================

/// Display name of a service and the raw column holding its Yes/No flag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceColumn {
    pub name: &'static str,
    pub column: &'static str,
}

pub const SERVICES: &[ServiceColumn] = &[
    ServiceColumn { name: "Online Security", column: columns::ONLINE_SECURITY },
    ServiceColumn { name: "Online Backup", column: columns::ONLINE_BACKUP },
    ServiceColumn { name: "Device Protection", column: columns::DEVICE_PROTECTION },
    ServiceColumn { name: "Tech Support", column: columns::TECH_SUPPORT },
    ServiceColumn { name: "Streaming TV", column: columns::STREAMING_TV },
];

// ============================================================================
// Revenue scenarios
// ============================================================================

/// Percent of at-risk revenue retained in each scenario row
pub const RETENTION_SCENARIOS: &[u32] = &[10, 25, 50, 75, 100];

/// Scenario row highlighted by default
pub const HIGHLIGHT_SCENARIO: u32 = 50;
