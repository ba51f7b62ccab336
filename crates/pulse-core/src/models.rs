//! Domain models for Pulse

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A pillar groups related metrics (e.g. Safety, Quality)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pillar {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub icon: Option<String>,
    pub display_order: i64,
    pub created_at: DateTime<Utc>,
}

/// A named, continuously measured KPI belonging to a pillar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub id: i64,
    pub pillar_id: i64,
    pub title: String,
    pub metric_type: MetricType,
    pub created_at: DateTime<Utc>,
}

/// How a metric's values are displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    #[default]
    Count,
    Percent,
    Duration,
}

impl MetricType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Percent => "percent",
            Self::Duration => "duration",
        }
    }
}

impl std::str::FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "percent" | "percentage" => Ok(Self::Percent),
            "duration" => Ok(Self::Duration),
            _ => Err(format!("Unknown metric type: {}", s)),
        }
    }
}

impl std::fmt::Display for MetricType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One observation for one metric on one calendar date
///
/// `(metric_id, date)` is the natural key; the batch pipeline guarantees at
/// most one row per date before anything reaches storage. The threshold
/// fields stay `None` when the spreadsheet leaves them blank: "not tracked"
/// is different from a threshold of zero and status coloring depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    pub date: NaiveDate,
    #[serde(default)]
    pub value: f64,
    pub goal: Option<f64>,
    pub meet_goal: Option<f64>,
    pub behind_goal: Option<f64>,
    pub at_risk: Option<f64>,
}

impl MeasurementRow {
    /// Row with a date and value only, thresholds untracked
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            goal: None,
            meet_goal: None,
            behind_goal: None,
            at_risk: None,
        }
    }

    /// Calendar year of the observation, for bucketing consumers
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Classify the observation against its configured thresholds
    ///
    /// Untracked (`None`) thresholds never trigger their band; a metric with
    /// no thresholds at all reports `Met` whenever it has a value.
    pub fn goal_status(&self) -> GoalStatus {
        if self.value == 0.0 {
            return GoalStatus::NoData;
        }
        let goal = self.goal.unwrap_or(0.0);
        if self.at_risk.is_some() && self.value < goal * 0.9 {
            return GoalStatus::AtRisk;
        }
        if self.behind_goal.is_some() && self.value < goal {
            return GoalStatus::Behind;
        }
        GoalStatus::Met
    }
}

/// Status band for a measurement relative to its goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Met,
    Behind,
    AtRisk,
    NoData,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Met => "met",
            Self::Behind => "behind",
            Self::AtRisk => "at_risk",
            Self::NoData => "no_data",
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display bucket granularity for charts and period labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Daily,
    #[default]
    Weekly,
    Monthly,
}

impl TimePeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for TimePeriod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            _ => Err(format!("Unknown time period: {}", s)),
        }
    }
}

impl std::fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Action plan item linked to a pillar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    pub id: i64,
    pub pillar_id: i64,
    pub title: String,
    pub due_date: NaiveDate,
    pub status: ActionPlanStatus,
    pub created_at: DateTime<Utc>,
}

/// Workflow status of an action plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ActionPlanStatus {
    #[default]
    Open,
    Pending,
    Overdue,
}

impl ActionPlanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Pending => "pending",
            Self::Overdue => "overdue",
        }
    }
}

impl std::str::FromStr for ActionPlanStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "pending" => Ok(Self::Pending),
            "overdue" => Ok(Self::Overdue),
            _ => Err(format!("Unknown action plan status: {}", s)),
        }
    }
}

impl std::fmt::Display for ActionPlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Access role; only admins may write measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }

    pub fn can_write(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "viewer" | "user" => Ok(Self::Viewer),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(value: f64) -> MeasurementRow {
        MeasurementRow::new(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(), value)
    }

    #[test]
    fn test_goal_status_no_data() {
        assert_eq!(row(0.0).goal_status(), GoalStatus::NoData);
    }

    #[test]
    fn test_goal_status_untracked_thresholds_never_trigger() {
        // No thresholds configured: any non-zero value counts as met
        assert_eq!(row(1.0).goal_status(), GoalStatus::Met);
    }

    #[test]
    fn test_goal_status_bands() {
        let mut r = row(8.0);
        r.goal = Some(10.0);
        r.behind_goal = Some(5.0);
        r.at_risk = Some(3.0);
        // 8.0 < 10 * 0.9 → at risk
        assert_eq!(r.goal_status(), GoalStatus::AtRisk);

        r.value = 9.5;
        assert_eq!(r.goal_status(), GoalStatus::Behind);

        r.value = 10.0;
        assert_eq!(r.goal_status(), GoalStatus::Met);
    }

    #[test]
    fn test_goal_status_zero_threshold_is_tracked() {
        // A configured threshold of zero still participates, unlike None
        let mut r = row(0.5);
        r.goal = Some(1.0);
        r.behind_goal = Some(0.0);
        assert_eq!(r.goal_status(), GoalStatus::Behind);

        let mut untracked = row(0.5);
        untracked.goal = Some(1.0);
        untracked.behind_goal = None;
        assert_eq!(untracked.goal_status(), GoalStatus::Met);
    }

    #[test]
    fn test_row_year() {
        assert_eq!(row(1.0).year(), 2025);
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("USER".parse::<Role>().unwrap(), Role::Viewer);
        assert!(Role::Admin.can_write());
        assert!(!Role::Viewer.can_write());
    }
}
