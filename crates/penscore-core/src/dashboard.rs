//! Progress statistics over a user's report history.

use serde::Serialize;

use crate::analysis::mean;
use crate::models::{Criterion, Language, Report};

/// Experience level earned by the number of analysed samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Badge {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Badge {
    pub fn for_count(total_reports: usize) -> Self {
        match total_reports {
            0..=3 => Badge::Beginner,
            4..=10 => Badge::Intermediate,
            11..=20 => Badge::Advanced,
            _ => Badge::Expert,
        }
    }

    /// Reports needed to reach this badge.
    pub fn threshold(&self) -> usize {
        match self {
            Badge::Beginner => 0,
            Badge::Intermediate => 4,
            Badge::Advanced => 11,
            Badge::Expert => 21,
        }
    }

    pub fn next(&self) -> Option<Badge> {
        match self {
            Badge::Beginner => Some(Badge::Intermediate),
            Badge::Intermediate => Some(Badge::Advanced),
            Badge::Advanced => Some(Badge::Expert),
            Badge::Expert => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Badge::Beginner => "Beginner",
            Badge::Intermediate => "Intermediate",
            Badge::Advanced => "Advanced",
            Badge::Expert => "Expert",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Badge::Beginner => "#0275d8",
            Badge::Intermediate => "#5cb85c",
            Badge::Advanced => "#f0ad4e",
            Badge::Expert => "#d9534f",
        }
    }
}

/// Distance to the next badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeProgress {
    pub badge: Badge,
    pub next_badge: String,
    pub remaining: usize,
}

impl BadgeProgress {
    pub fn for_count(total_reports: usize) -> Self {
        let badge = Badge::for_count(total_reports);
        match badge.next() {
            Some(next) => Self {
                badge,
                next_badge: next.name().to_string(),
                remaining: next.threshold() - total_reports,
            },
            None => Self {
                badge,
                next_badge: "Max Level Reached".to_string(),
                remaining: 0,
            },
        }
    }
}

/// Mean trait scores over the reports of one script.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptAverages {
    pub language: Language,
    pub reports: usize,
    pub traits: Vec<(Criterion, f64)>,
}

impl ScriptAverages {
    pub fn get(&self, criterion: Criterion) -> Option<f64> {
        self.traits
            .iter()
            .find(|(c, _)| *c == criterion)
            .map(|(_, v)| *v)
    }
}

/// Points for the progress chart, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub dates: Vec<String>,
    pub overall: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_reports: usize,
    pub average_score: f64,
    pub best_score: f64,
    pub worst_score: f64,
    pub improvement: f64,
    pub progress: BadgeProgress,
    pub scripts: Vec<ScriptAverages>,
    pub suggestions: Vec<String>,
    pub chart: ChartSeries,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage change from the first to the last overall score.
pub fn improvement(first: f64, last: f64) -> f64 {
    if first == 0.0 {
        return 0.0;
    }
    round2((last - first) / first * 100.0)
}

fn script_averages(reports: &[Report], language: Language) -> Option<ScriptAverages> {
    let matching: Vec<&Report> = reports.iter().filter(|r| r.language() == language).collect();
    if matching.is_empty() {
        return None;
    }

    let traits = language
        .criteria()
        .into_iter()
        .map(|criterion| {
            let values: Vec<f64> = matching
                .iter()
                .filter_map(|r| r.scores.get(criterion))
                .collect();
            (criterion, mean(&values).unwrap_or(0.0))
        })
        .collect();

    Some(ScriptAverages {
        language,
        reports: matching.len(),
        traits,
    })
}

fn trend_suggestion(improvement: f64) -> &'static str {
    if improvement > 10.0 {
        "Great job! Your handwriting has improved significantly."
    } else if improvement < -5.0 {
        "Your score dropped recently. Try slowing down your writing and focusing on shapes."
    } else {
        "Your handwriting is stable. Try practicing curves and slants to improve further."
    }
}

fn script_suggestions(averages: &ScriptAverages) -> Vec<&'static str> {
    let mut out = Vec::new();
    let below = |c: Criterion, limit: f64| averages.get(c).is_some_and(|v| v < limit);

    match averages.language {
        Language::English => {
            match averages.get(Criterion::Spacing) {
                Some(v) if v < 40.0 => {
                    out.push("Your spacing is tight. Try practicing equal spacing between letters.")
                }
                Some(v) if v > 70.0 => {
                    out.push(
                        "Your spacing is wide. Try keeping letters closer to improve consistency.",
                    )
                }
                _ => {}
            }
            if below(Criterion::Consistency, 50.0) {
                out.push(
                    "Your letter consistency needs attention. Try rewriting the same word multiple times.",
                );
            }
            if below(Criterion::Neatness, 50.0) {
                out.push(
                    "Work on your neatness. Practice writing slowly and cleanly for 5 minutes daily.",
                );
            }
        }
        Language::Devanagari => {
            if below(Criterion::Shirorekha, 50.0) {
                out.push("Draw the shirorekha in one steady stroke across each word.");
            }
            if below(Criterion::Matra, 50.0) {
                out.push(
                    "Your matras are faint. Practice clear vertical strokes on the matra worksheet.",
                );
            }
            if below(Criterion::Samanta, 50.0) {
                out.push(
                    "Character heights vary a lot. Write between two guide lines to keep them even.",
                );
            }
        }
    }
    out
}

/// Aggregate a user's reports. Expects them oldest first; `None` when empty.
pub fn summarize(reports: &[Report]) -> Option<DashboardStats> {
    let first = reports.first()?;
    let last = reports.last()?;

    let overall: Vec<f64> = reports.iter().map(|r| r.overall).collect();
    let average = mean(&overall).unwrap_or(0.0);
    let best = overall.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let worst = overall.iter().copied().fold(f64::INFINITY, f64::min);
    let improvement = improvement(first.overall, last.overall);

    let scripts: Vec<ScriptAverages> = [Language::English, Language::Devanagari]
        .into_iter()
        .filter_map(|language| script_averages(reports, language))
        .collect();

    let mut suggestions = vec![trend_suggestion(improvement).to_string()];
    for averages in &scripts {
        suggestions.extend(script_suggestions(averages).into_iter().map(String::from));
    }

    Some(DashboardStats {
        total_reports: reports.len(),
        average_score: round2(average),
        best_score: best,
        worst_score: worst,
        improvement,
        progress: BadgeProgress::for_count(reports.len()),
        scripts,
        suggestions,
        chart: ChartSeries {
            dates: reports.iter().map(Report::date).collect(),
            overall,
        },
    })
}
