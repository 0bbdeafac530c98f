pub mod complementarity;
pub mod lists;
pub mod ranker;
pub mod ranking;
pub mod selections;
pub mod storage;
pub mod strategy;
pub mod sync;

pub use complementarity::{Factors, Preference, Weights};
pub use lists::{DefenseEntry, ListError, ListKind, PickLists};
pub use ranker::{
    rank, RankError, Recommendation, RecommendationRequest, RecommendationSet, ScoutingSnapshot,
    MAX_RECOMMENDATIONS,
};
pub use ranking::{RankingInfo, RankingTable};
pub use selections::{
    AllianceSelections, Position, RemoteSelections, SelectionError, SelectionState, SlotKey,
    SyncOutcome, ALLIANCE_COUNT,
};
pub use storage::{get_lists_path, load_lists, save_lists, ListState};
pub use strategy::{
    analyze, predict, AllianceAdvice, AllianceColor, AllianceProjection, Prediction, StrategyReport,
    TeamProjection, CLOSE_MATCH_MARGIN,
};
pub use sync::{SelectionStore, SelectionSync, SyncError, DEFAULT_SYNC_INTERVAL};
