use thiserror::Error;

#[derive(Debug, Error)]
pub enum OdexError {
    #[error("you must specify the OData service endpoint URL")]
    MissingEndpoint,

    #[error("endpoint '{0}' is not configured")]
    EndpointNotFound(String),

    #[error("no metadata available for endpoint {0} (configure `metadata` or pass --metadata)")]
    MetadataUnavailable(String),

    #[error("metadata declares no entity types")]
    NoEntityTypes,

    #[error("metadata declares no entity container")]
    NoEntityContainer,

    #[error("entity '{0}' not found")]
    EntityNotFound(String),

    #[error("invalid entity id {0}")]
    InvalidEntityId(usize),

    #[error("entity '{0}' has a cyclic or dangling base type chain")]
    InvalidInheritance(String),

    #[error("no entity set exposes entity '{0}'")]
    NoEntitySet(String),

    #[error("no entity selected")]
    NoEntitySelected,

    #[error("entity '{entity}' has no property or navigation property '{name}'")]
    ItemNotFound { entity: String, name: String },

    #[error("entity '{entity}' has no query item with id {item}")]
    InvalidItemId { entity: String, item: usize },

    #[error("'{0}' is not a property")]
    NotAProperty(String),

    #[error("'{0}' is not a navigation property")]
    NotANavigationProperty(String),

    #[error("filter path is empty")]
    EmptyPath,

    #[error("filter path navigates {depth} level(s) deep, the maximum is {max}")]
    NavigationDepthExceeded { depth: usize, max: usize },

    #[error("cannot resolve navigation property '{0}' through the association sets")]
    UnresolvedNavigation(String),

    #[error("{0}")]
    PropertyNotQueryable(String),

    #[error("operator '{operator}' is not available for {family} properties")]
    OperatorNotFound { family: String, operator: String },

    #[error("invalid filter value '{value}': expected {expected}")]
    InvalidFilterValue { expected: String, value: String },

    #[error("filter '{0}' not found")]
    FilterNotFound(String),

    #[error("a page size ($top) is required to paginate")]
    PageSizeRequired,

    #[error("unknown results format")]
    UnknownResultsFormat,

    #[error("invalid query plan: {0}")]
    InvalidPlan(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl OdexError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingEndpoint => "missing_endpoint",
            Self::EndpointNotFound(_) => "endpoint_not_found",
            Self::MetadataUnavailable(_) => "metadata_unavailable",
            Self::NoEntityTypes => "no_entity_types",
            Self::NoEntityContainer => "no_entity_container",
            Self::EntityNotFound(_) => "entity_not_found",
            Self::InvalidEntityId(_) => "invalid_entity_id",
            Self::InvalidInheritance(_) => "invalid_inheritance",
            Self::NoEntitySet(_) => "no_entity_set",
            Self::NoEntitySelected => "no_entity_selected",
            Self::ItemNotFound { .. } => "item_not_found",
            Self::InvalidItemId { .. } => "invalid_item_id",
            Self::NotAProperty(_) => "not_a_property",
            Self::NotANavigationProperty(_) => "not_a_navigation_property",
            Self::EmptyPath => "empty_path",
            Self::NavigationDepthExceeded { .. } => "navigation_depth_exceeded",
            Self::UnresolvedNavigation(_) => "unresolved_navigation",
            Self::PropertyNotQueryable(_) => "property_not_queryable",
            Self::OperatorNotFound { .. } => "operator_not_found",
            Self::InvalidFilterValue { .. } => "invalid_filter_value",
            Self::FilterNotFound(_) => "filter_not_found",
            Self::PageSizeRequired => "page_size_required",
            Self::UnknownResultsFormat => "unknown_results_format",
            Self::InvalidPlan(_) => "invalid_plan",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
            Self::Yaml(_) => "yaml_error",
        }
    }
}

pub type Result<T> = std::result::Result<T, OdexError>;
