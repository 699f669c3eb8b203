use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Countries a restaurant can be registered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Country {
    Ethiopia,
    #[serde(rename = "USA")]
    Usa,
    Canada,
    Mexico,
    China,
    Japan,
}

impl Country {
    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Ethiopia => "Ethiopia",
            Country::Usa => "USA",
            Country::Canada => "Canada",
            Country::Mexico => "Mexico",
            Country::China => "China",
            Country::Japan => "Japan",
        }
    }

    /// Fixed country to currency lookup.
    pub fn currency(&self) -> &'static str {
        match self {
            Country::Ethiopia => "ETB",
            Country::Usa => "USD",
            Country::Canada => "CAD",
            Country::Mexico => "MXN",
            Country::China => "CNY",
            Country::Japan => "JPY",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_follows_country() {
        assert_eq!(Country::Ethiopia.currency(), "ETB");
        assert_eq!(Country::Usa.currency(), "USD");
        assert_eq!(Country::Japan.currency(), "JPY");
    }

    #[test]
    fn usa_keeps_its_upper_case_name() {
        let country: Country = serde_json::from_str("\"USA\"").unwrap();
        assert_eq!(country, Country::Usa);
        assert_eq!(country.as_str(), "USA");
    }
}
