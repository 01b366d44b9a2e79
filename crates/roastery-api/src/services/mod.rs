// Services layer for business logic
// Services own validation and id parsing, calling repositories and workflows
// handed to them at construction

pub mod coffee;
pub mod event;

pub use coffee::CoffeeService;
pub use event::EventService;
