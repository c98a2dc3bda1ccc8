use geo::Point;
use serde::{Deserialize, Serialize};
use typed_floats::tf64::NonNaN;

/// One row of the companies dataset. Coordinates stay raw text until
/// validated, the source data has plenty of blanks and NaNs.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub cnpj: String,
    #[serde(default)]
    pub trade_name: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub latitude: String,
    #[serde(default)]
    pub longitude: String,
}

impl Company {
    pub fn display_name(&self) -> &str {
        if self.trade_name.is_empty() {
            &self.name
        } else {
            &self.trade_name
        }
    }

    pub fn cnpj_digits(&self) -> String {
        self.cnpj.chars().filter(|c| c.is_ascii_digit()).collect()
    }

    /// None unless both coordinates parse as finite numbers.
    pub fn point(&self) -> Option<Point> {
        Some(Point::new(
            coordinate(&self.longitude)?,
            coordinate(&self.latitude)?,
        ))
    }
}

fn coordinate(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then_some(value)
}

/// Field order doubles as the output column order.
pub const FIELDNAMES: [&str; 11] = [
    "id",
    "keyword",
    "latitude",
    "longitude",
    "distance",
    "name",
    "address",
    "phone",
    "cnpj",
    "company_name",
    "company_trade_name",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: Option<String>,
    pub keyword: String,
    pub latitude: f64,
    pub longitude: f64,
    pub distance: NonNaN,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    pub cnpj: String,
    pub company_name: String,
    pub company_trade_name: String,
}

impl Place {
    pub fn company_display(&self) -> &str {
        if self.company_trade_name.is_empty() {
            &self.company_name
        } else {
            &self.company_trade_name
        }
    }
}
