//! Statewise: a small finite state machine runtime
//!
//! A machine owns a fixed set of states, each identified by a key, tracks
//! which one is active, and dispatches `enter`/`exit`/`update` hooks as the
//! active state changes. States drive their own transitions from inside those
//! hooks through a back-reference to their machine.
//!
//! # Core Concepts
//!
//! - **State**: behavior for one mode, via the `State` trait
//! - **FiniteStateMachine**: owns the states and performs transitions
//! - **FiniteStateMachineBuilder**: assembles a machine from state instances
//!
//! # Example
//!
//! ```rust
//! use statewise::{FiniteStateMachineBuilder, FsmResult, OwnerCell, State};
//!
//! struct Blink {
//!     on: bool,
//!     owner: OwnerCell<bool>,
//! }
//!
//! impl State<bool> for Blink {
//!     fn key(&self) -> bool {
//!         self.on
//!     }
//!
//!     fn owner_cell(&self) -> &OwnerCell<bool> {
//!         &self.owner
//!     }
//!
//!     fn update(&mut self, _elapsed: f64) -> FsmResult<(), bool> {
//!         self.transition_to(!self.on)
//!     }
//! }
//!
//! let mut builder = FiniteStateMachineBuilder::with_initial_state(Blink {
//!     on: false,
//!     owner: OwnerCell::new(),
//! });
//! builder.with_state(Blink { on: true, owner: OwnerCell::new() })?;
//! let mut fsm = builder.build()?;
//!
//! fsm.enter_state()?;
//! fsm.update_state(1.0)?;
//! assert!(fsm.current());
//! assert_eq!(fsm.previous(), Some(false));
//! fsm.exit_state()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod builder;
pub mod core;
pub mod machine;

// Re-export commonly used types
pub use self::builder::{BuildError, BuildResult, FiniteStateMachineBuilder};
pub use self::core::{FsmError, FsmResult, Owner, OwnerCell, State, StateHistory, StateKey};
pub use self::machine::FiniteStateMachine;
