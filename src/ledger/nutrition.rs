use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::models::{Food, GoalsRow};

/// Calories and protein grams, either one entry's contribution or a day total.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Nutrients {
    pub calories: i64,
    pub proteins: f64,
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Derived contribution of `quantity` grams of `food` (values are per 100 g).
pub fn contribution(food: &Food, quantity: i64) -> Nutrients {
    let grams = quantity as f64;
    Nutrients {
        calories: (food.calories as f64 * grams / 100.0).round() as i64,
        proteins: round2(food.proteins * grams / 100.0),
    }
}

impl Nutrients {
    pub fn consumed(goals: &GoalsRow) -> Self {
        Self {
            calories: goals.calories_consumed,
            proteins: goals.proteins_consumed,
        }
    }

    /// Floors both totals at zero.
    pub fn clamped(self) -> Self {
        Self {
            calories: self.calories.max(0),
            proteins: self.proteins.max(0.0),
        }
    }
}

impl Add for Nutrients {
    type Output = Nutrients;

    fn add(self, rhs: Nutrients) -> Nutrients {
        Nutrients {
            calories: self.calories.saturating_add(rhs.calories),
            proteins: round2(self.proteins + rhs.proteins),
        }
    }
}

impl Sub for Nutrients {
    type Output = Nutrients;

    fn sub(self, rhs: Nutrients) -> Nutrients {
        Nutrients {
            calories: self.calories.saturating_sub(rhs.calories),
            proteins: round2(self.proteins - rhs.proteins),
        }
    }
}

/// How the UI should paint a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Warning,
}

/// Negative calories remaining means the target was exceeded.
pub fn calories_tone(remaining: i64) -> Tone {
    if remaining < 0 {
        Tone::Warning
    } else {
        Tone::Success
    }
}

/// Protein remaining reads inverted: anything still left to eat is flagged.
pub fn proteins_tone(remaining: f64) -> Tone {
    if remaining > 0.0 {
        Tone::Warning
    } else {
        Tone::Success
    }
}

#[cfg(test)]
mod nutrition_tests {
    use super::*;
    use uuid::Uuid;

    fn food(calories: i64, proteins: f64) -> Food {
        Food {
            id: Uuid::new_v4(),
            name: "test".into(),
            category: "other".into(),
            calories,
            proteins,
        }
    }

    #[test]
    fn contribution_scales_per_100g() {
        let c = contribution(&food(200, 10.0), 150);
        assert_eq!(c, Nutrients { calories: 300, proteins: 15.0 });
    }

    #[test]
    fn contribution_rounds_calories_and_proteins() {
        // 52 * 33 / 100 = 17.16 ; 0.3 * 33 / 100 = 0.099
        let c = contribution(&food(52, 0.3), 33);
        assert_eq!(c.calories, 17);
        assert_eq!(c.proteins, 0.1);

        // half rounds up
        let c = contribution(&food(1, 0.0), 50);
        assert_eq!(c.calories, 1);
    }

    #[test]
    fn clamped_floors_at_zero() {
        let n = Nutrients { calories: 100, proteins: 5.0 } - Nutrients { calories: 300, proteins: 15.5 };
        assert_eq!(n, Nutrients { calories: -200, proteins: -10.5 });
        assert_eq!(n.clamped(), Nutrients { calories: 0, proteins: 0.0 });
    }

    #[test]
    fn sums_do_not_accumulate_float_noise() {
        let mut total = Nutrients::default();
        for _ in 0..10 {
            total = total + Nutrients { calories: 1, proteins: 0.1 };
        }
        assert_eq!(total.proteins, 1.0);
    }

    #[test]
    fn calorie_sums_saturate_instead_of_overflowing() {
        let big = Nutrients { calories: i64::MAX, proteins: 0.0 };
        assert_eq!((big + big).calories, i64::MAX);

        let low = Nutrients { calories: i64::MIN, proteins: 0.0 };
        assert_eq!((low - big).calories, i64::MIN);
        assert_eq!((low - big).clamped().calories, 0);
    }

    #[test]
    fn tones_follow_display_rules() {
        assert_eq!(calories_tone(500), Tone::Success);
        assert_eq!(calories_tone(0), Tone::Success);
        assert_eq!(calories_tone(-300), Tone::Warning);

        assert_eq!(proteins_tone(20.0), Tone::Warning);
        assert_eq!(proteins_tone(0.0), Tone::Success);
        assert_eq!(proteins_tone(-4.5), Tone::Success);
    }
}
