pub mod fva;
pub mod results;
pub mod solver;
pub mod solver_factory;
pub mod solvers;
pub mod task_counter;
pub mod validate;
pub mod worker;
