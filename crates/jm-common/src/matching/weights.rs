use super::Dimension;

/// Fixed weighting used for the overall match score.
/// Skills dominate; location, experience and text similarity share the middle tier.
pub const DEFAULT_WEIGHTS: Weights = Weights {
    skills: 0.25,
    experience: 0.15,
    education: 0.10,
    location: 0.15,
    salary: 0.10,
    semantic: 0.15,
    behavior: 0.10,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
    pub location: f64,
    pub salary: f64,
    pub semantic: f64,
    pub behavior: f64,
}

impl Default for Weights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.skills
            + self.experience
            + self.education
            + self.location
            + self.salary
            + self.semantic
            + self.behavior
    }

    pub fn weight(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Skills => self.skills,
            Dimension::Experience => self.experience,
            Dimension::Education => self.education,
            Dimension::Location => self.location,
            Dimension::Salary => self.salary,
            Dimension::Semantic => self.semantic,
            Dimension::Behavior => self.behavior,
        }
    }
}
