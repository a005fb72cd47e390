use std::{fmt::Display, ops::Deref};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value < 0. || value.is_nan() {
            None
        } else {
            Some(Percentage(value))
        }
    }

    pub fn zero() -> Percentage {
        Percentage(0.)
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `whole` taken by `part`. An empty whole has no shares, so everything is 0%.
pub fn hours_percentage(part: f64, whole: f64) -> Percentage {
    if whole <= 0. {
        return Percentage::zero();
    }
    Percentage::new_opt(part / whole * 100.).unwrap_or_else(Percentage::zero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hours_percentage() {
        assert_eq!(*hours_percentage(1., 4.), 25.);
        assert_eq!(*hours_percentage(0., 0.), 0.);
        assert_eq!(hours_percentage(2.5, 10.).to_string(), "25%");
    }

    #[test]
    fn test_negative_rejected() {
        assert!(Percentage::new_opt(-1.).is_none());
    }
}
