pub mod formatter;

pub use formatter::{
    format_alliances, format_answer, format_breakdown, format_chart, format_lists, format_rankings,
    format_recommendations, format_score, format_search, format_strategy, format_team_detail,
    should_use_colors,
};
