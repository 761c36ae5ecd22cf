use tandem::AccessCoordinator;

/// Server state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub coordinator: AccessCoordinator,
}

impl AppState {
    pub fn new(coordinator: AccessCoordinator) -> Self {
        Self { coordinator }
    }
}
