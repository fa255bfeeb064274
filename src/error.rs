pub type Result<T> = std::result::Result<T, ChartError>;

/// Structural problems with the record set or a by-id request.
///
/// None of these are fatal: the operation that produced one is aborted and
/// the chart keeps its previous state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChartError {
    #[error("no records to lay out")]
    EmptyData,

    #[error("node with id ({id}) already exists in tree")]
    DuplicateId { id: String },

    #[error("parent node with id ({parent_id}) of node ({id}) not found in the tree")]
    MissingParent { id: String, parent_id: String },

    #[error("node id ({id}) uses the reserved group-toggle suffix")]
    ReservedId { id: String },

    #[error("more than one root record: ({first}) and ({second})")]
    MultipleRoots { first: String, second: String },

    #[error("parent chain of node ({id}) never reaches the root")]
    Cycle { id: String },

    #[error("{op}: node with id ({id}) not found in the tree")]
    UnknownNode { op: &'static str, id: String },

    #[error("cannot move node ({id}) under ({target})")]
    InvalidMove { id: String, target: String },

    #[error("invalid record: {message}")]
    InvalidRecord { message: String },
}
