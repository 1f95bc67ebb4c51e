/// 1) Trim whitespace + strip outer quotes and a leading byte-order mark.
pub fn clean_str(raw: &str) -> String {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim().to_string()
    } else {
        trimmed.to_string()
    }
}

/// Outcome of coercing a raw cell to a number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coerced {
    Parsed(f64),
    /// The cell was absent, empty or not a finite number.
    Defaulted,
}

impl Coerced {
    pub fn value(self) -> f64 {
        match self {
            Coerced::Parsed(v) => v,
            Coerced::Defaulted => 0.0,
        }
    }

    pub fn is_default(self) -> bool {
        matches!(self, Coerced::Defaulted)
    }
}

/// 2) Coerce a cleaned string into a finite f64.
pub fn coerce_number(raw: Option<&str>) -> Coerced {
    let Some(raw) = raw else {
        return Coerced::Defaulted;
    };
    match clean_str(raw).parse::<f64>() {
        Ok(v) if v.is_finite() => Coerced::Parsed(v),
        _ => Coerced::Defaulted,
    }
}

/// 3) Round to `digits` decimal places.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let scale = 10f64.powi(digits);
    (value * scale).round() / scale
}
