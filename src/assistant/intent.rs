use regex::Regex;
use std::sync::LazyLock;

/// How many teams a "top"/"best" question lists when it names no count.
pub const DEFAULT_TOP_N: usize = 5;

static TOP_N: LazyLock<Regex> = LazyLock::new(|| word_regex(r"(?:top|best)\s+(\d+)"));
static NUMBER: LazyLock<Regex> = LazyLock::new(|| word_regex(r"(\d{1,4})"));

static COMPARE: LazyLock<Regex> = LazyLock::new(|| {
    word_regex(r"(compare[sd]?|comparison|vs|versus|against|better than|compared to)")
});
static RULES: LazyLock<Regex> =
    LazyLock::new(|| word_regex(r"(scoring rules?|rules|point values?|worth)"));
static CLIMB: LazyLock<Regex> = LazyLock::new(|| word_regex(r"(climb\w*|barge|endgame|hang\w*)"));
static DEFENSE: LazyLock<Regex> = LazyLock::new(|| word_regex(r"(defen[sc]e|defensive|defender\w*)"));
static TOP: LazyLock<Regex> =
    LazyLock::new(|| word_regex(r"(top|best|highest|strongest|rank\w*|scor\w*|leader\w*)"));
static HELP: LazyLock<Regex> =
    LazyLock::new(|| word_regex(r"(help|what can you do|capabilities|how do i|how to)"));
static GREETING: LazyLock<Regex> =
    LazyLock::new(|| word_regex(r"(hi|hello|hey|greetings|howdy)"));

fn word_regex(body: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", body)).expect("static pattern compiles")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Help,
    TeamInfo(Vec<u32>),
    Compare(Vec<u32>),
    TopScorers(usize),
    BestClimbers(usize),
    BestDefense(usize),
    ScoringRules,
    Unknown,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Help => "help",
            Intent::TeamInfo(_) => "team_info",
            Intent::Compare(_) => "compare",
            Intent::TopScorers(_) => "top_scorers",
            Intent::BestClimbers(_) => "best_climbers",
            Intent::BestDefense(_) => "best_defense",
            Intent::ScoringRules => "scoring_rules",
            Intent::Unknown => "unknown",
        }
    }
}

/// Count asked for by "top N" / "best N", if any.
pub fn requested_count(question: &str) -> Option<usize> {
    TOP_N
        .captures(question)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

/// Team numbers mentioned in a question, in order of first mention.
///
/// Numbers belonging to "top N" or "best N" are not teams.
pub fn extract_team_numbers(question: &str) -> Vec<u32> {
    let stripped = TOP_N.replace_all(question, " ");
    let mut teams = Vec::new();
    for capture in NUMBER.captures_iter(&stripped) {
        let Some(team) = capture.get(1).and_then(|m| m.as_str().parse::<u32>().ok()) else {
            continue;
        };
        if (1..=9999).contains(&team) && !teams.contains(&team) {
            teams.push(team);
        }
    }
    teams
}

/// Classify a question by keyword. Team mentions take precedence over
/// leaderboard questions, and a greeting only wins when nothing else does.
pub fn detect_intent(question: &str) -> Intent {
    let teams = extract_team_numbers(question);
    let count = || requested_count(question).unwrap_or(DEFAULT_TOP_N);

    if teams.len() >= 2 && COMPARE.is_match(question) {
        return Intent::Compare(teams);
    }
    if !teams.is_empty() {
        return Intent::TeamInfo(teams);
    }
    if RULES.is_match(question) {
        return Intent::ScoringRules;
    }
    if CLIMB.is_match(question) {
        return Intent::BestClimbers(count());
    }
    if DEFENSE.is_match(question) {
        return Intent::BestDefense(count());
    }
    if TOP.is_match(question) {
        return Intent::TopScorers(count());
    }
    if HELP.is_match(question) {
        return Intent::Help;
    }
    if GREETING.is_match(question) {
        return Intent::Greeting;
    }
    Intent::Unknown
}
