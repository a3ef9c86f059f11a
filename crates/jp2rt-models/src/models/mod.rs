pub mod adaboost;
pub mod factory;
pub mod forest;
pub mod gradient_boosting;
pub mod hist_gradient_boosting;
pub mod regressor_trait;
pub mod tree;

pub use factory::{fit_regressor, Regressor};
pub use regressor_trait::RegressorModel;
