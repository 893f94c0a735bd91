//! Traffic Light State Machine
//!
//! This example drives a traffic light with a fixed time step.
//!
//! Key concepts:
//! - Per-state countdown timers reset on `enter`
//! - Self-initiated transitions from `update`
//! - Branching on `previous`: Yellow goes Green after Red, Red after Green
//!
//! Run with: cargo run --example traffic_light
//! Set RUST_LOG=statewise=debug to see each transition.

use statewise::{state_keys, FiniteStateMachineBuilder, FsmResult, OwnerCell, State};
use tracing_subscriber::EnvFilter;

const MAX_TIME: f64 = 30.0;
const DELTA_TIME: f64 = 1.0;

state_keys! {
    enum Light {
        Red,
        Yellow,
        Green,
    }
}

/// Shared behavior of every light: hold for `duration`, then move on.
struct LightState {
    light: Light,
    duration: f64,
    timer: f64,
    owner: OwnerCell<Light>,
}

impl LightState {
    fn new(light: Light, duration: f64) -> Self {
        Self {
            light,
            duration,
            timer: 0.0,
            owner: OwnerCell::new(),
        }
    }

    fn red() -> Self {
        Self::new(Light::Red, 8.0)
    }

    fn yellow() -> Self {
        Self::new(Light::Yellow, 1.0)
    }

    fn green() -> Self {
        Self::new(Light::Green, 6.0)
    }

    fn next_light(&self) -> FsmResult<Light, Light> {
        let next = match self.light {
            Light::Red | Light::Green => Light::Yellow,
            Light::Yellow => match self.owner()?.previous()? {
                Some(Light::Red) => Light::Green,
                _ => Light::Red,
            },
        };
        Ok(next)
    }
}

impl State<Light> for LightState {
    fn key(&self) -> Light {
        self.light
    }

    fn owner_cell(&self) -> &OwnerCell<Light> {
        &self.owner
    }

    fn enter(&mut self) -> FsmResult<(), Light> {
        self.timer = self.duration;
        Ok(())
    }

    fn update(&mut self, elapsed: f64) -> FsmResult<(), Light> {
        self.timer -= elapsed;
        if self.timer <= 0.0 {
            self.transition_to(self.next_light()?)?;
        }
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Traffic Light State Machine ===\n");

    let mut builder = FiniteStateMachineBuilder::with_initial_state(LightState::red());
    builder
        .with_state(LightState::yellow())?
        .with_state(LightState::green())?;
    let mut fsm = builder.build()?;

    fsm.enter_state()?;

    let mut time = 0.0;
    println!("{time}: {}", fsm.current());
    while time < MAX_TIME {
        fsm.update_state(DELTA_TIME)?;
        time += DELTA_TIME;
        println!("{time}: {}", fsm.current());
    }

    fsm.exit_state()?;

    println!("\n=== Example Complete ===");
    Ok(())
}
