//! Journey detour validation
//!
//! A journey is an ordered run of milestones. Detours are sub-journeys that
//! branch off at fractional positions between milestones (2.5 sits between
//! milestones 2 and 3) and optionally rejoin later. A journey is declared as
//! one unit, so [`validate_detours`] runs eagerly at registration and fails
//! on the first violation; [`audit_detours`] re-checks the graph on demand
//! against other registered journeys and only reports.

use crate::error::DetourError;
use crate::ordering::Severity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A milestone's position within its journey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestonePoint {
    /// Milestone name
    pub name: String,

    /// Position (conventionally an integer)
    pub order: f64,
}

impl MilestonePoint {
    /// Create milestone point
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>, order: f64) -> Self {
        Self {
            name: name.into(),
            order,
        }
    }
}

/// Where a detour returns to the main journey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RejoinPoint {
    /// A milestone order
    Order(f64),

    /// A milestone name
    Milestone(String),
}

/// A detour declared on a journey
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detour {
    /// Sub-journey taken (canonical journey name)
    pub journey: String,

    /// Fractional branch position
    pub order: f64,

    /// Milestone after which the detour may trigger
    pub triggered_after: Option<String>,

    /// Where the detour returns
    pub rejoins_at: Option<RejoinPoint>,

    /// Free-form condition description
    pub condition: Option<String>,
}

impl Detour {
    /// Create detour at an order
    #[must_use]
    pub fn new(journey: impl Into<String>, order: f64) -> Self {
        Self {
            journey: journey.into(),
            order,
            triggered_after: None,
            rejoins_at: None,
            condition: None,
        }
    }

    /// With trigger milestone
    #[inline]
    #[must_use]
    pub fn triggered_after(mut self, milestone: impl Into<String>) -> Self {
        self.triggered_after = Some(milestone.into());
        self
    }

    /// With rejoin point
    #[inline]
    #[must_use]
    pub fn rejoins_at(mut self, point: RejoinPoint) -> Self {
        self.rejoins_at = Some(point);
        self
    }

    /// With condition description
    #[inline]
    #[must_use]
    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

fn same_order(a: f64, b: f64) -> bool {
    (a - b).abs() < f64::EPSILON
}

fn has_fraction(order: f64) -> bool {
    !same_order(order.fract(), 0.0)
}

/// Validate a journey's detours
///
/// Checks, per detour in declaration order:
/// 1. order is finite and has a fractional part
/// 2. order is distinct from every earlier detour's
///
/// and, when the journey declares milestones:
/// 3. `triggered_after` names a milestone
/// 4. `rejoins_at` matches a milestone order or name
/// 5. the order's floor equals, or is one less than, a milestone order
///
/// # Errors
/// Returns the first [`DetourError`] found.
pub fn validate_detours(
    journey: &str,
    milestones: &[MilestonePoint],
    detours: &[Detour],
) -> Result<(), DetourError> {
    for (i, detour) in detours.iter().enumerate() {
        if !detour.order.is_finite() {
            return Err(DetourError::NonFiniteOrder {
                journey: journey.to_string(),
                detour: detour.journey.clone(),
                order: detour.order,
            });
        }
        if !has_fraction(detour.order) {
            return Err(DetourError::IntegerOrder {
                journey: journey.to_string(),
                detour: detour.journey.clone(),
                order: detour.order,
            });
        }
        if let Some(earlier) = detours[..i].iter().find(|d| same_order(d.order, detour.order)) {
            return Err(DetourError::DuplicateOrder {
                journey: journey.to_string(),
                first: earlier.journey.clone(),
                second: detour.journey.clone(),
                order: detour.order,
            });
        }

        if milestones.is_empty() {
            continue;
        }

        if let Some(trigger) = &detour.triggered_after {
            if !milestones.iter().any(|m| &m.name == trigger) {
                return Err(DetourError::UnknownTrigger {
                    journey: journey.to_string(),
                    detour: detour.journey.clone(),
                    milestone: trigger.clone(),
                });
            }
        }

        match &detour.rejoins_at {
            Some(RejoinPoint::Order(order)) => {
                if !milestones.iter().any(|m| same_order(m.order, *order)) {
                    return Err(DetourError::UnknownRejoinOrder {
                        journey: journey.to_string(),
                        detour: detour.journey.clone(),
                        order: *order,
                    });
                }
            }
            Some(RejoinPoint::Milestone(name)) => {
                if !milestones.iter().any(|m| &m.name == name) {
                    return Err(DetourError::UnknownRejoinMilestone {
                        journey: journey.to_string(),
                        detour: detour.journey.clone(),
                        milestone: name.clone(),
                    });
                }
            }
            None => {}
        }

        let floor = detour.order.floor();
        let adjacent = milestones
            .iter()
            .any(|m| same_order(floor, m.order) || same_order(floor, m.order - 1.0));
        if !adjacent {
            return Err(DetourError::NotBetweenMilestones {
                journey: journey.to_string(),
                detour: detour.journey.clone(),
                order: detour.order,
            });
        }
    }

    Ok(())
}

/// What the registry knows about a detour's sub-journey
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubJourney {
    /// Not registered
    Missing,

    /// Registered and marked as a detour
    Detour,

    /// Registered as an ordinary journey
    Primary,
}

/// One finding of a detour audit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetourFinding {
    /// Sub-journey is not registered
    SubJourneyMissing {
        /// Sub-journey name
        detour: String,
    },

    /// Sub-journey is registered but not marked as a detour
    SubJourneyNotDetour {
        /// Sub-journey name
        detour: String,
    },

    /// Several detours share an order
    DuplicateOrder {
        /// Shared order
        order: f64,
        /// Detours sharing it
        detours: Vec<String>,
    },

    /// Detour order lies outside the milestone range
    OutsideMilestoneRange {
        /// Sub-journey name
        detour: String,
        /// Detour order
        order: f64,
        /// Lowest milestone order
        min: f64,
        /// Highest milestone order
        max: f64,
    },
}

impl DetourFinding {
    /// Finding severity
    #[must_use]
    pub fn severity(&self) -> Severity {
        match self {
            Self::DuplicateOrder { .. } => Severity::Error,
            Self::SubJourneyMissing { .. }
            | Self::SubJourneyNotDetour { .. }
            | Self::OutsideMilestoneRange { .. } => Severity::Warning,
        }
    }
}

impl fmt::Display for DetourFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubJourneyMissing { detour } => {
                write!(f, "detour journey '{detour}' is not registered")
            }
            Self::SubJourneyNotDetour { detour } => {
                write!(f, "journey '{detour}' is used as a detour but not marked as one")
            }
            Self::DuplicateOrder { order, detours } => {
                write!(f, "detour order {order} used by {}", detours.join(", "))
            }
            Self::OutsideMilestoneRange {
                detour,
                order,
                min,
                max,
            } => write!(
                f,
                "detour '{detour}' order {order} lies outside milestone range {min}..={max}"
            ),
        }
    }
}

/// Result of [`audit_detours`]
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DetourAudit {
    /// Audited journey
    pub journey: String,

    /// Error-severity findings
    pub errors: Vec<DetourFinding>,

    /// Warning-severity findings
    pub warnings: Vec<DetourFinding>,
}

impl DetourAudit {
    /// No errors
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// No findings at all
    #[inline]
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    fn push(&mut self, finding: DetourFinding) {
        match finding.severity() {
            Severity::Error => self.errors.push(finding),
            Severity::Warning => self.warnings.push(finding),
        }
    }
}

/// Audit a journey's detour graph without failing
///
/// `sub_journey` reports what the caller's journey registry knows about each
/// detour's sub-journey.
pub fn audit_detours<F>(
    journey: &str,
    milestones: &[MilestonePoint],
    detours: &[Detour],
    mut sub_journey: F,
) -> DetourAudit
where
    F: FnMut(&str) -> SubJourney,
{
    let mut audit = DetourAudit {
        journey: journey.to_string(),
        ..DetourAudit::default()
    };

    for detour in detours {
        match sub_journey(&detour.journey) {
            SubJourney::Missing => audit.push(DetourFinding::SubJourneyMissing {
                detour: detour.journey.clone(),
            }),
            SubJourney::Primary => audit.push(DetourFinding::SubJourneyNotDetour {
                detour: detour.journey.clone(),
            }),
            SubJourney::Detour => {}
        }
    }

    let mut seen: Vec<f64> = Vec::new();
    for detour in detours {
        if seen.iter().any(|o| same_order(*o, detour.order)) {
            continue;
        }
        seen.push(detour.order);

        let sharing: Vec<String> = detours
            .iter()
            .filter(|d| same_order(d.order, detour.order))
            .map(|d| d.journey.clone())
            .collect();
        if sharing.len() > 1 {
            audit.push(DetourFinding::DuplicateOrder {
                order: detour.order,
                detours: sharing,
            });
        }
    }

    let min = milestones.iter().map(|m| m.order).reduce(f64::min);
    let max = milestones.iter().map(|m| m.order).reduce(f64::max);
    if let (Some(min), Some(max)) = (min, max) {
        for detour in detours {
            if detour.order < min || detour.order > max {
                audit.push(DetourFinding::OutsideMilestoneRange {
                    detour: detour.journey.clone(),
                    order: detour.order,
                    min,
                    max,
                });
            }
        }
    }

    if !audit.is_clean() {
        tracing::warn!(
            journey,
            errors = audit.errors.len(),
            warnings = audit.warnings.len(),
            "detour audit findings"
        );
    }

    audit
}
