//! Shared test support: customer fixtures and a workbook reader that
//! evaluates the formula subset the renderer writes.
//!
//! The renderer never computes aggregates itself, so the only way to check
//! its output is to recalculate the formulas. `EvaluatedBook` reads the XLSX
//! back with calamine and evaluates COUNTA, COUNTIF(S), SUM, SUMIF(S),
//! AVERAGE, AVERAGEIF, IF, arithmetic, comparisons and `&` on demand.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use churnbook_core::{RawTable, RawValue};

// =============================================================================
// Fixtures
// =============================================================================

pub const TELCO_HEADERS: [&str; 21] = [
    "customerID",
    "gender",
    "SeniorCitizen",
    "Partner",
    "Dependents",
    "tenure",
    "PhoneService",
    "MultipleLines",
    "InternetService",
    "OnlineSecurity",
    "OnlineBackup",
    "DeviceProtection",
    "TechSupport",
    "StreamingTV",
    "StreamingMovies",
    "Contract",
    "PaperlessBilling",
    "PaymentMethod",
    "MonthlyCharges",
    "TotalCharges",
    "Churn",
];

/// One customer with only the fields the reports read
#[derive(Clone, Debug)]
pub struct Customer {
    pub id: String,
    pub tenure: u32,
    /// OnlineSecurity, OnlineBackup, DeviceProtection, TechSupport, StreamingTV
    pub services: [bool; 5],
    pub contract: &'static str,
    pub payment: &'static str,
    pub charges: f64,
    pub churned: bool,
}

impl Customer {
    pub fn new(id: &str, tenure: u32, contract: &'static str, charges: f64, churned: bool) -> Self {
        Self {
            id: id.to_string(),
            tenure,
            services: [false; 5],
            contract,
            payment: "Electronic check",
            charges,
            churned,
        }
    }

    pub fn payment(mut self, payment: &'static str) -> Self {
        self.payment = payment;
        self
    }

    pub fn services(mut self, services: [bool; 5]) -> Self {
        self.services = services;
        self
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

/// Build a full 21-column telco table from customers
pub fn telco_table(customers: &[Customer]) -> RawTable {
    let mut table = RawTable::new(TELCO_HEADERS.iter().map(|h| (*h).to_string()).collect());
    for c in customers {
        let s = c.services;
        let fields = [
            c.id.clone(),
            "Female".into(),
            "0".into(),
            "Yes".into(),
            "No".into(),
            c.tenure.to_string(),
            "Yes".into(),
            "No".into(),
            "Fiber optic".into(),
            yes_no(s[0]).into(),
            yes_no(s[1]).into(),
            yes_no(s[2]).into(),
            yes_no(s[3]).into(),
            yes_no(s[4]).into(),
            "No".into(),
            c.contract.into(),
            "Yes".into(),
            c.payment.into(),
            c.charges.to_string(),
            (c.charges * f64::from(c.tenure.max(1))).to_string(),
            yes_no(c.churned).into(),
        ];
        table.push_row(fields.iter().map(|f| RawValue::infer(f)).collect());
    }
    table
}

/// A dozen customers covering every contract type, payment method and
/// tenure bucket except 49-60 months.
pub fn sample_customers() -> Vec<Customer> {
    vec![
        Customer::new("0001-A", 1, "Month-to-month", 29.85, true),
        Customer::new("0002-B", 5, "Month-to-month", 70.70, true)
            .payment("Mailed check")
            .services([true, false, false, false, true]),
        Customer::new("0003-C", 12, "Month-to-month", 53.85, false)
            .services([false, true, false, false, false]),
        Customer::new("0004-D", 13, "One year", 42.30, false)
            .payment("Bank transfer (automatic)")
            .services([true, true, true, true, false]),
        Customer::new("0005-E", 20, "Month-to-month", 99.65, true)
            .payment("Credit card (automatic)")
            .services([false, false, true, false, true]),
        Customer::new("0006-F", 30, "One year", 56.95, false)
            .payment("Mailed check")
            .services([true, false, false, true, false]),
        Customer::new("0007-G", 36, "Two year", 89.10, false)
            .payment("Credit card (automatic)")
            .services([true, true, true, true, true]),
        Customer::new("0008-H", 40, "One year", 104.80, true)
            .services([false, true, true, false, true]),
        Customer::new("0009-I", 45, "Two year", 20.15, false)
            .payment("Bank transfer (automatic)"),
        Customer::new("0010-J", 62, "Two year", 115.50, false)
            .payment("Credit card (automatic)")
            .services([true, true, true, true, true]),
        Customer::new("0011-K", 70, "Two year", 25.25, false)
            .payment("Bank transfer (automatic)")
            .services([false, false, false, true, false]),
        Customer::new("0012-L", 72, "One year", 64.75, true)
            .payment("Mailed check")
            .services([true, false, true, false, false]),
    ]
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

// =============================================================================
// Workbook reader
// =============================================================================

/// Evaluated cell value
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Bool(bool),
    Empty,
    Error(String),
    Range(Vec<Value>),
}

impl Value {
    fn as_number(&self) -> Result<f64, String> {
        match self {
            Value::Number(n) => Ok(*n),
            Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Value::Empty => Ok(0.0),
            Value::Error(e) => Err(e.clone()),
            Value::Text(s) => s.parse().map_err(|_| "#VALUE!".to_string()),
            Value::Range(_) => Err("#VALUE!".to_string()),
        }
    }

    fn as_text(&self) -> String {
        match self {
            Value::Number(n) => n.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            _ => String::new(),
        }
    }

    fn cells(self) -> Vec<Value> {
        match self {
            Value::Range(cells) => cells,
            other => vec![other],
        }
    }
}

type Pos = (u32, u32);

/// A rendered workbook read back from bytes
pub struct EvaluatedBook {
    sheet_names: Vec<String>,
    formulas: HashMap<String, HashMap<Pos, String>>,
    values: HashMap<String, HashMap<Pos, Data>>,
}

impl EvaluatedBook {
    pub fn open(bytes: &[u8]) -> Self {
        let mut xlsx: Xlsx<_> = Xlsx::new(Cursor::new(bytes.to_vec())).expect("readable xlsx");
        let sheet_names = xlsx.sheet_names().clone();
        let mut formulas = HashMap::new();
        let mut values = HashMap::new();

        for name in &sheet_names {
            let range = xlsx.worksheet_formula(name).expect("formula range");
            let (r0, c0) = range.start().unwrap_or((0, 0));
            let cells: HashMap<Pos, String> = range
                .used_cells()
                .filter(|(_, _, f)| !f.is_empty())
                .map(|(r, c, f)| ((r0 + r as u32, c0 + c as u32), f.clone()))
                .collect();
            formulas.insert(name.clone(), cells);

            let range = xlsx.worksheet_range(name).expect("value range");
            let (r0, c0) = range.start().unwrap_or((0, 0));
            let cells: HashMap<Pos, Data> = range
                .used_cells()
                .map(|(r, c, v)| ((r0 + r as u32, c0 + c as u32), v.clone()))
                .collect();
            values.insert(name.clone(), cells);
        }

        Self {
            sheet_names,
            formulas,
            values,
        }
    }

    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }

    /// Formula text of a cell, with its leading `=`
    pub fn formula(&self, sheet: &str, cell: &str) -> Option<String> {
        let pos = parse_cell(cell).expect("valid cell reference");
        self.formulas
            .get(sheet)?
            .get(&pos)
            .map(|f| format!("={}", f.trim_start_matches('=')))
    }

    pub fn formula_count(&self, sheet: &str) -> usize {
        self.formulas.get(sheet).map_or(0, HashMap::len)
    }

    /// Literal (non-formula) text of a cell
    pub fn literal_text(&self, sheet: &str, cell: &str) -> Option<String> {
        let pos = parse_cell(cell).expect("valid cell reference");
        match self.values.get(sheet)?.get(&pos)? {
            Data::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    /// Recalculate a cell
    pub fn value(&self, sheet: &str, cell: &str) -> Value {
        let pos = parse_cell(cell).expect("valid cell reference");
        self.cell_value(sheet, pos)
    }

    /// Recalculate a cell that must be a number
    pub fn number(&self, sheet: &str, cell: &str) -> f64 {
        match self.value(sheet, cell) {
            Value::Number(n) => n,
            other => panic!("{sheet}!{cell} evaluated to {other:?}"),
        }
    }

    fn cell_value(&self, sheet: &str, pos: Pos) -> Value {
        if let Some(formula) = self.formulas.get(sheet).and_then(|f| f.get(&pos)) {
            let text = formula.trim_start_matches('=');
            let tokens = tokenize(text);
            let mut parser = Parser { tokens, pos: 0 };
            let expr = parser.expression();
            assert_eq!(parser.pos, parser.tokens.len(), "trailing tokens in {text}");
            return self.eval(&expr, sheet);
        }
        match self.values.get(sheet).and_then(|v| v.get(&pos)) {
            Some(Data::Float(n)) => Value::Number(*n),
            Some(Data::Int(n)) => Value::Number(*n as f64),
            Some(Data::String(s)) => Value::Text(s.clone()),
            Some(Data::Bool(b)) => Value::Bool(*b),
            _ => Value::Empty,
        }
    }

    fn eval(&self, expr: &Expr, sheet: &str) -> Value {
        match expr {
            Expr::Number(n) => Value::Number(*n),
            Expr::Text(s) => Value::Text(s.clone()),
            Expr::Neg(inner) => match self.eval(inner, sheet).as_number() {
                Ok(n) => Value::Number(-n),
                Err(e) => Value::Error(e),
            },
            Expr::Ref { sheet: target, start, end } => {
                let target = target.as_deref().unwrap_or(sheet);
                match end {
                    None => self.cell_value(target, *start),
                    Some(end) => {
                        let mut cells = Vec::new();
                        for row in start.0.min(end.0)..=start.0.max(end.0) {
                            for col in start.1.min(end.1)..=start.1.max(end.1) {
                                cells.push(self.cell_value(target, (row, col)));
                            }
                        }
                        Value::Range(cells)
                    }
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let l = self.eval(lhs, sheet);
                let r = self.eval(rhs, sheet);
                binary(*op, &l, &r)
            }
            Expr::Call(name, args) => self.call(name, args, sheet),
        }
    }

    fn call(&self, name: &str, args: &[Expr], sheet: &str) -> Value {
        let eval_all = || -> Vec<Value> { args.iter().map(|a| self.eval(a, sheet)).collect() };
        match name {
            "IF" => {
                let cond = self.eval(&args[0], sheet);
                let truthy = match cond {
                    Value::Error(e) => return Value::Error(e),
                    Value::Bool(b) => b,
                    other => other.as_number().map(|n| n != 0.0).unwrap_or(false),
                };
                if truthy {
                    self.eval(&args[1], sheet)
                } else {
                    args.get(2).map_or(Value::Bool(false), |e| self.eval(e, sheet))
                }
            }
            "COUNTA" => {
                let count = eval_all()
                    .into_iter()
                    .flat_map(Value::cells)
                    .filter(|v| !matches!(v, Value::Empty))
                    .count();
                Value::Number(count as f64)
            }
            "SUM" => {
                let total = eval_all()
                    .into_iter()
                    .flat_map(Value::cells)
                    .filter_map(|v| match v {
                        Value::Number(n) => Some(n),
                        _ => None,
                    })
                    .sum();
                Value::Number(total)
            }
            "AVERAGE" => {
                let nums: Vec<f64> = eval_all()
                    .into_iter()
                    .flat_map(Value::cells)
                    .filter_map(|v| match v {
                        Value::Number(n) => Some(n),
                        _ => None,
                    })
                    .collect();
                average(&nums)
            }
            "COUNTIF" | "COUNTIFS" => {
                let values = eval_all();
                let mask = criteria_mask(&values);
                Value::Number(mask.iter().filter(|m| **m).count() as f64)
            }
            "SUMIF" | "AVERAGEIF" => {
                let mut values = eval_all();
                let target = values.pop().expect("sum range").cells();
                let mask = criteria_mask(&values);
                let picked: Vec<f64> = picked_numbers(&target, &mask);
                if name == "SUMIF" {
                    Value::Number(picked.iter().sum())
                } else {
                    average(&picked)
                }
            }
            "SUMIFS" => {
                let mut values = eval_all();
                let target = values.remove(0).cells();
                let mask = criteria_mask(&values);
                Value::Number(picked_numbers(&target, &mask).iter().sum())
            }
            other => panic!("unsupported function {other}"),
        }
    }
}

fn average(nums: &[f64]) -> Value {
    if nums.is_empty() {
        Value::Error("#DIV/0!".into())
    } else {
        Value::Number(nums.iter().sum::<f64>() / nums.len() as f64)
    }
}

fn picked_numbers(target: &[Value], mask: &[bool]) -> Vec<f64> {
    target
        .iter()
        .zip(mask)
        .filter(|(_, m)| **m)
        .filter_map(|(v, _)| match v {
            Value::Number(n) => Some(*n),
            _ => None,
        })
        .collect()
}

/// Pairs of (range, criterion) combined with AND
fn criteria_mask(values: &[Value]) -> Vec<bool> {
    let mut mask: Option<Vec<bool>> = None;
    for pair in values.chunks(2) {
        let cells = pair[0].clone().cells();
        let criterion = &pair[1];
        let hits: Vec<bool> = cells.iter().map(|c| criterion_matches(criterion, c)).collect();
        mask = Some(match mask {
            None => hits,
            Some(prev) => prev.iter().zip(&hits).map(|(a, b)| *a && *b).collect(),
        });
    }
    mask.unwrap_or_default()
}

fn criterion_matches(criterion: &Value, cell: &Value) -> bool {
    let text = match criterion {
        Value::Number(n) => return matches!(cell, Value::Number(v) if (v - n).abs() < 1e-10),
        other => other.as_text(),
    };
    for op in [">=", "<=", "<>", ">", "<", "="] {
        let Some(rest) = text.strip_prefix(op) else {
            continue;
        };
        if let Ok(bound) = rest.trim().parse::<f64>() {
            let Value::Number(v) = cell else { return false };
            return match op {
                ">=" => *v >= bound,
                "<=" => *v <= bound,
                "<>" => (*v - bound).abs() >= 1e-10,
                ">" => *v > bound,
                "<" => *v < bound,
                _ => (*v - bound).abs() < 1e-10,
            };
        }
        break;
    }
    if let Ok(n) = text.parse::<f64>() {
        return matches!(cell, Value::Number(v) if (v - n).abs() < 1e-10);
    }
    match cell {
        Value::Text(s) => s.eq_ignore_ascii_case(&text),
        _ => false,
    }
}

fn binary(op: char, l: &Value, r: &Value) -> Value {
    if op == '&' {
        return Value::Text(format!("{}{}", l.as_text(), r.as_text()));
    }
    if matches!(op, '=' | 'n' | '<' | '>' | 'l' | 'g') {
        let ord = match (l.as_number(), r.as_number()) {
            (Ok(a), Ok(b)) => a.partial_cmp(&b),
            _ => Some(l.as_text().to_lowercase().cmp(&r.as_text().to_lowercase())),
        };
        let ord = ord.unwrap_or(std::cmp::Ordering::Equal);
        let result = match op {
            '=' => ord.is_eq(),
            'n' => ord.is_ne(),
            '<' => ord.is_lt(),
            '>' => ord.is_gt(),
            'l' => ord.is_le(),
            _ => ord.is_ge(),
        };
        return Value::Bool(result);
    }
    let (a, b) = match (l.as_number(), r.as_number()) {
        (Ok(a), Ok(b)) => (a, b),
        (Err(e), _) | (_, Err(e)) => return Value::Error(e),
    };
    match op {
        '+' => Value::Number(a + b),
        '-' => Value::Number(a - b),
        '*' => Value::Number(a * b),
        '/' if b == 0.0 => Value::Error("#DIV/0!".into()),
        '/' => Value::Number(a / b),
        other => panic!("unsupported operator {other}"),
    }
}

// =============================================================================
// Formula parsing
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Ident(String),
    Op(char),
    LParen,
    RParen,
    Comma,
    Colon,
    Bang,
}

fn tokenize(src: &str) -> Vec<Token> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            ':' => {
                tokens.push(Token::Colon);
                i += 1;
            }
            '!' => {
                tokens.push(Token::Bang);
                i += 1;
            }
            '"' => {
                let mut text = String::new();
                i += 1;
                loop {
                    if chars[i] == '"' {
                        if chars.get(i + 1) == Some(&'"') {
                            text.push('"');
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    text.push(chars[i]);
                    i += 1;
                }
                tokens.push(Token::Text(text));
            }
            '<' | '>' => {
                // Two-char comparisons are encoded as 'n' (<>), 'l' (<=), 'g' (>=)
                let next = chars.get(i + 1).copied();
                let op = match (c, next) {
                    ('<', Some('>')) => Some('n'),
                    ('<', Some('=')) => Some('l'),
                    ('>', Some('=')) => Some('g'),
                    _ => None,
                };
                match op {
                    Some(op) => {
                        tokens.push(Token::Op(op));
                        i += 2;
                    }
                    None => {
                        tokens.push(Token::Op(c));
                        i += 1;
                    }
                }
            }
            '+' | '-' | '*' | '/' | '&' | '=' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            d if d.is_ascii_digit() || d == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // A digit run followed by letters is not expected in our formulas
                let text: String = chars[start..i].iter().collect();
                tokens.push(Token::Number(text.parse().expect("number literal")));
            }
            a if a.is_ascii_alphabetic() || a == '_' || a == '$' => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphanumeric() || chars[i] == '_' || chars[i] == '$')
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => panic!("unexpected character {other:?} in {src}"),
        }
    }
    tokens
}

#[derive(Debug)]
enum Expr {
    Number(f64),
    Text(String),
    Neg(Box<Expr>),
    Ref {
        sheet: Option<String>,
        start: Pos,
        end: Option<Pos>,
    },
    Binary(char, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn expression(&mut self) -> Expr {
        let lhs = self.concat();
        if let Some(Token::Op(op @ ('=' | 'n' | '<' | '>' | 'l' | 'g'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.concat();
            return Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        lhs
    }

    fn concat(&mut self) -> Expr {
        let mut lhs = self.additive();
        while let Some(Token::Op('&')) = self.peek() {
            self.pos += 1;
            let rhs = self.additive();
            lhs = Expr::Binary('&', Box::new(lhs), Box::new(rhs));
        }
        lhs
    }

    fn additive(&mut self) -> Expr {
        let mut lhs = self.term();
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.term();
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        lhs
    }

    fn term(&mut self) -> Expr {
        let mut lhs = self.unary();
        while let Some(Token::Op(op @ ('*' | '/'))) = self.peek().cloned() {
            self.pos += 1;
            let rhs = self.unary();
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        lhs
    }

    fn unary(&mut self) -> Expr {
        if let Some(Token::Op('-')) = self.peek() {
            self.pos += 1;
            return Expr::Neg(Box::new(self.unary()));
        }
        self.primary()
    }

    fn primary(&mut self) -> Expr {
        match self.next() {
            Token::Number(n) => Expr::Number(n),
            Token::Text(s) => Expr::Text(s),
            Token::LParen => {
                let inner = self.expression();
                assert_eq!(self.next(), Token::RParen);
                inner
            }
            Token::Ident(name) => match self.peek() {
                Some(Token::LParen) => {
                    self.pos += 1;
                    let mut args = Vec::new();
                    if self.peek() != Some(&Token::RParen) {
                        loop {
                            args.push(self.expression());
                            match self.next() {
                                Token::Comma => continue,
                                Token::RParen => break,
                                other => panic!("unexpected {other:?} in arguments"),
                            }
                        }
                    } else {
                        self.pos += 1;
                    }
                    Expr::Call(name.to_uppercase(), args)
                }
                Some(Token::Bang) => {
                    self.pos += 1;
                    let Token::Ident(cell) = self.next() else {
                        panic!("expected cell after {name}!")
                    };
                    self.reference(Some(name), &cell)
                }
                _ => self.reference(None, &name),
            },
            other => panic!("unexpected token {other:?}"),
        }
    }

    fn reference(&mut self, sheet: Option<String>, cell: &str) -> Expr {
        let start = parse_cell(cell).unwrap_or_else(|| panic!("bad reference {cell}"));
        let end = if let Some(Token::Colon) = self.peek() {
            self.pos += 1;
            let Token::Ident(end) = self.next() else {
                panic!("expected range end")
            };
            Some(parse_cell(&end).unwrap_or_else(|| panic!("bad reference {end}")))
        } else {
            None
        };
        Expr::Ref { sheet, start, end }
    }
}

/// "B6" -> zero-based (row, col)
pub fn parse_cell(cell: &str) -> Option<Pos> {
    let cell = cell.replace('$', "");
    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() {
        return None;
    }
    let mut col = 0u32;
    for ch in letters.chars() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        col = col * 26 + (ch as u32 - 'A' as u32 + 1);
    }
    let row: u32 = digits.parse().ok()?;
    Some((row.checked_sub(1)?, col - 1))
}
