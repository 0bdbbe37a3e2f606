use url::form_urlencoded;

/// Default page size for incident listings.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Default candidate filter: confirmed incidents only.
pub const DEFAULT_CANDIDATE: Option<bool> = Some(false);

/// Sort field and direction for a listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortSpec {
    /// Field identifier, e.g. `creation_time` or `severity`.
    pub id: String,
    /// Whether to sort descending.
    pub desc: bool,
}

impl SortSpec {
    /// Ascending sort on `id`.
    pub fn asc(id: impl Into<String>) -> Self {
        Self { id: id.into(), desc: false }
    }

    /// Descending sort on `id`.
    pub fn desc(id: impl Into<String>) -> Self {
        Self { id: id.into(), desc: true }
    }

    /// Serialized form: `id` ascending, `-id` descending.
    fn to_param(&self) -> String {
        if self.desc { format!("-{}", self.id) } else { self.id.clone() }
    }
}

/// Default ordering: newest incidents first.
pub fn default_sorting() -> SortSpec {
    SortSpec::desc("creation_time")
}

/// Parameters of the incident listing endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncidentsQuery {
    /// Tri-state candidate filter. `None` omits the parameter entirely;
    /// `Some(false)` requests confirmed incidents only.
    pub candidate: Option<bool>,
    /// Tri-state filter for prediction-engine incidents.
    pub predicted: Option<bool>,
    /// Page size. Invariant: `limit > 0`.
    pub limit: u64,
    /// Page offset. Invariant: `offset >= 0`.
    pub offset: u64,
    /// Result ordering.
    pub sorting: SortSpec,
    /// CEL filter expression; empty means unfiltered.
    pub cel: String,
}

impl Default for IncidentsQuery {
    fn default() -> Self {
        Self {
            candidate: DEFAULT_CANDIDATE,
            predicted: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
            sorting: default_sorting(),
            cel: String::new(),
        }
    }
}

impl IncidentsQuery {
    /// Serialize to a query string.
    ///
    /// Parameter order is fixed (candidate, predicted, limit, offset,
    /// sorting, cel) so identical logical inputs always produce
    /// byte-identical strings and therefore one cache key.
    pub fn to_query_string(&self) -> String {
        let mut qs = form_urlencoded::Serializer::new(String::new());
        if let Some(candidate) = self.candidate {
            qs.append_pair("candidate", bool_str(candidate));
        }
        if let Some(predicted) = self.predicted {
            qs.append_pair("predicted", bool_str(predicted));
        }
        qs.append_pair("limit", &self.limit.to_string());
        qs.append_pair("offset", &self.offset.to_string());
        qs.append_pair("sorting", &self.sorting.to_param());
        if !self.cel.is_empty() {
            qs.append_pair("cel", &self.cel);
        }
        qs.finish()
    }

    /// Path-and-query for the listing endpoint.
    pub fn to_path(&self) -> String {
        format!("/incidents?{}", self.to_query_string())
    }
}

const fn bool_str(v: bool) -> &'static str {
    if v { "true" } else { "false" }
}

/// Optional attribute filters over the incident listing.
///
/// `None` means "no filter on this attribute"; `Some(vec![])` matches
/// nothing. Compiled down to a CEL expression for the `cel` parameter.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSet {
    /// Incident statuses to match.
    pub statuses: Option<Vec<String>>,
    /// Incident severities to match.
    pub severities: Option<Vec<String>>,
    /// Assignees to match.
    pub assignees: Option<Vec<String>>,
    /// Alert sources to match.
    pub sources: Option<Vec<String>>,
    /// Affected services to match.
    pub services: Option<Vec<String>>,
}

impl FilterSet {
    /// Compile to a CEL expression, or an empty string when unfiltered.
    pub fn to_cel(&self) -> String {
        let mut clauses = Vec::new();
        push_clause(&mut clauses, "status", self.statuses.as_ref());
        push_clause(&mut clauses, "severity", self.severities.as_ref());
        push_clause(&mut clauses, "assignee", self.assignees.as_ref());
        push_clause(&mut clauses, "source", self.sources.as_ref());
        push_clause(&mut clauses, "service", self.services.as_ref());
        clauses.join(" && ")
    }
}

fn push_clause(clauses: &mut Vec<String>, field: &str, values: Option<&Vec<String>>) {
    if let Some(values) = values {
        let list = values.iter().map(|v| format!("'{v}'")).collect::<Vec<_>>().join(", ");
        clauses.push(format!("{field} in [{list}]"));
    }
}

/// Path for a single incident.
pub(crate) fn incident_path(incident_id: &str) -> String {
    format!("/incidents/{incident_id}")
}

/// Path-and-query for the alerts attached to an incident.
pub(crate) fn incident_alerts_path(incident_id: &str, limit: u64, offset: u64) -> String {
    format!("/incidents/{incident_id}/alerts?limit={limit}&offset={offset}")
}

/// Path for incidents predicted to follow an incident.
pub(crate) fn future_incidents_path(incident_id: &str) -> String {
    format!("/incidents/{incident_id}/future_incidents")
}

/// Path-and-query for the workflow executions tied to an incident.
pub(crate) fn incident_workflows_path(incident_id: &str, limit: u64, offset: u64) -> String {
    format!("/incidents/{incident_id}/workflows?limit={limit}&offset={offset}")
}

/// Path for the aggregate incidents metadata.
pub(crate) const INCIDENTS_META_PATH: &str = "/incidents/meta";

#[cfg(test)]
mod tests {
    use super::{FilterSet, IncidentsQuery, SortSpec};

    #[test]
    fn identical_inputs_build_identical_strings() {
        let build = || IncidentsQuery {
            candidate: Some(true),
            predicted: Some(false),
            limit: 50,
            offset: 100,
            sorting: SortSpec::asc("severity"),
            cel: "status in ['firing']".to_owned(),
        };
        let first = build().to_query_string();
        let second = build().to_query_string();
        assert_eq!(first, second);
    }

    #[test]
    fn tri_state_none_omits_but_false_is_included() {
        let omitted = IncidentsQuery { candidate: None, ..Default::default() };
        assert!(!omitted.to_query_string().contains("candidate"));

        let explicit = IncidentsQuery { candidate: Some(false), ..Default::default() };
        assert!(explicit.to_query_string().contains("candidate=false"));
    }

    #[test]
    fn sorting_serializes_direction_as_sign() {
        let desc = IncidentsQuery { sorting: SortSpec::desc("severity"), ..Default::default() };
        assert!(desc.to_query_string().contains("sorting=-severity"));

        let asc = IncidentsQuery { sorting: SortSpec::asc("severity"), ..Default::default() };
        assert!(asc.to_query_string().contains("sorting=severity"));
        assert!(!asc.to_query_string().contains("sorting=-severity"));
    }

    #[test]
    fn default_listing_path_matches_wire_format() {
        let query = IncidentsQuery {
            candidate: Some(true),
            predicted: None,
            limit: 20,
            offset: 0,
            sorting: SortSpec::desc("creation_time"),
            cel: String::new(),
        };
        assert_eq!(
            query.to_path(),
            "/incidents?candidate=true&limit=20&offset=0&sorting=-creation_time"
        );
    }

    #[test]
    fn cel_expression_is_percent_encoded() {
        let query = IncidentsQuery {
            candidate: None,
            cel: "status in ['firing']".to_owned(),
            ..Default::default()
        };
        assert!(query.to_query_string().ends_with("cel=status+in+%5B%27firing%27%5D"));
    }

    #[test]
    fn filter_set_compiles_to_cel_clauses() {
        let filters = FilterSet {
            statuses: Some(vec!["firing".to_owned(), "acknowledged".to_owned()]),
            severities: Some(vec!["critical".to_owned()]),
            ..Default::default()
        };
        assert_eq!(
            filters.to_cel(),
            "status in ['firing', 'acknowledged'] && severity in ['critical']"
        );
    }

    #[test]
    fn absent_filters_compile_to_no_expression() {
        assert_eq!(FilterSet::default().to_cel(), "");
    }
}
