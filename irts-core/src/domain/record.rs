use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One row of term-structure parameters: a curve category on a date.
///
/// Numeric fields are `None` when the source left them blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterRecord {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub curve_type: String,
    pub b1: Option<f64>,
    pub b2: Option<f64>,
    pub b3: Option<f64>,
    pub b4: Option<f64>,
    pub l1: Option<f64>,
    pub l2: Option<f64>,
}

impl ParameterRecord {
    /// A record with every parameter absent.
    pub fn empty(date: NaiveDate, curve_type: impl Into<String>) -> Self {
        Self {
            date,
            curve_type: curve_type.into(),
            b1: None,
            b2: None,
            b3: None,
            b4: None,
            l1: None,
            l2: None,
        }
    }

    /// The six parameters in column order.
    pub fn values(&self) -> [Option<f64>; 6] {
        [self.b1, self.b2, self.b3, self.b4, self.l1, self.l2]
    }
}
