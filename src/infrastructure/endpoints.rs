//! Resource paths of the catalogue API

use crate::domain::EntityRef;

/// Templates resource paths below a base path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoints {
    base: String,
}

impl Endpoints {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, rest: &str) -> String {
        if self.base.is_empty() {
            rest.to_string()
        } else {
            format!("{}/{}", self.base, rest)
        }
    }

    pub fn data_types_all(&self) -> String {
        self.url("data-types/all")
    }

    pub fn measurables_all(&self) -> String {
        self.url("measurable/all")
    }

    pub fn measurables_related_to(&self, entity: &EntityRef) -> String {
        self.url(&format!("measurable/entity/{}/{}", entity.kind, entity.id))
    }

    pub fn diagrams_by_kind(&self, kind: &str) -> String {
        self.url(&format!("svg-diagram/kind/{}", kind))
    }

    pub fn panels_by_group(&self, group: &str) -> String {
        self.url(&format!("static-panel/group/{}", group))
    }

    pub fn lineage_flows(&self) -> String {
        self.url("physical-flow/described-lineage")
    }

    pub fn lineage_specifications(&self) -> String {
        self.url("physical-specification/described-lineage")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_empty_base_when_templating_then_paths_are_relative() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.measurables_all(), "measurable/all");
        assert_eq!(
            endpoints.measurables_related_to(&EntityRef::new("APPLICATION", 12i64)),
            "measurable/entity/APPLICATION/12"
        );
    }

    #[test]
    fn given_base_with_trailing_slash_when_templating_then_single_separator() {
        let endpoints = Endpoints::new("api/");
        assert_eq!(endpoints.panels_by_group("HOME.DATA-TYPE"), "api/static-panel/group/HOME.DATA-TYPE");
        assert_eq!(endpoints.diagrams_by_kind("DATA_TYPE"), "api/svg-diagram/kind/DATA_TYPE");
    }
}
