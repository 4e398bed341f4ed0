//! Control primitives shared by the wheel and mission tasks
pub mod centroid;
pub mod kinematics;
pub mod odometry;
pub mod pi;
