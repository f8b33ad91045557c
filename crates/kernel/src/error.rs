use crate::config::TravelModel;
use crate::model::StopId;

/// Errors from world construction, configuration and external commands.
///
/// Stepping never returns these: invalid transitions during a tick are
/// logged and recovered locally.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("unknown depot stop {0}")]
    UnknownDepotStop(StopId),
    #[error("invalid plan target `{0}`")]
    InvalidTarget(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("travel model {0:?} is not supported")]
    UnsupportedTravelModel(TravelModel),
    #[error("problem has no node {0} for the depot")]
    MissingDepotNode(u32),
    #[error("duplicate node id {0}")]
    DuplicateNode(u32),
    #[error("station {0} has no node position")]
    MissingStationNode(u32),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
