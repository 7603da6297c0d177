//! Route strategies: how live traffic moves from blue to green.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Mechanism used for the traffic cut-over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case", from = "String")]
pub enum RouteStrategy {
    /// Rewrite ingress backends to the parallel `-green` services.
    Ingress,
    /// Shift weight in an SMI TrafficSplit.
    ServiceMesh,
    /// Flip the version label in the existing service selector. Default.
    #[default]
    Service,
}

impl RouteStrategy {
    /// Parse a strategy name. Unknown values fall back to `Service`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "ingress" => RouteStrategy::Ingress,
            "smi" | "service-mesh" | "servicemesh" => RouteStrategy::ServiceMesh,
            _ => RouteStrategy::Service,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStrategy::Ingress => "ingress",
            RouteStrategy::ServiceMesh => "smi",
            RouteStrategy::Service => "service",
        }
    }
}

impl FromStr for RouteStrategy {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for RouteStrategy {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl fmt::Display for RouteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_service() {
        assert_eq!(RouteStrategy::default(), RouteStrategy::Service);
    }

    #[test]
    fn parses_known_names_case_insensitively() {
        assert_eq!(RouteStrategy::parse("INGRESS"), RouteStrategy::Ingress);
        assert_eq!(RouteStrategy::parse("smi"), RouteStrategy::ServiceMesh);
        assert_eq!(RouteStrategy::parse("service-mesh"), RouteStrategy::ServiceMesh);
        assert_eq!(RouteStrategy::parse(" Service "), RouteStrategy::Service);
    }

    #[test]
    fn unknown_values_fall_back_to_service() {
        assert_eq!(RouteStrategy::parse("canary"), RouteStrategy::Service);
        assert_eq!(RouteStrategy::parse(""), RouteStrategy::Service);
        assert_eq!("gateway".parse::<RouteStrategy>().unwrap(), RouteStrategy::Service);
    }

    #[test]
    fn deserializes_with_fallback() {
        let strategy: RouteStrategy = serde_json::from_str("\"smi\"").unwrap();
        assert_eq!(strategy, RouteStrategy::ServiceMesh);
        let strategy: RouteStrategy = serde_json::from_str("\"bogus\"").unwrap();
        assert_eq!(strategy, RouteStrategy::Service);
        assert_eq!(
            serde_json::to_string(&RouteStrategy::ServiceMesh).unwrap(),
            "\"service-mesh\""
        );
    }
}
