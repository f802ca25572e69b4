//! Defines the Component trait, to be used by each SoundScope processing
//! stage. This enforces a common interface between stages, so that each
//! stage can consume data from the preceding stage, process it, and pass
//! new data to the subsequent stage in the pipeline.

use log::{error, info, warn};
use std::fmt;
use std::sync::mpsc::{Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::config::ConfigError;

/// Errors a stage can hit while converting or shutting down. A convert
/// error is fatal to the stage; the stage logs it and stops, which closes
/// its output channel and winds down everything downstream.
#[derive(Debug)]
pub enum ComponentError {
    /// A structural misconfiguration surfaced mid-stream, like a block
    /// arriving with the wrong channel count.
    ConfigError(ConfigError),
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentError::ConfigError(e) => write!(f, "{}", e),
        }
    }
}

impl From<ConfigError> for ComponentError {
    fn from(value: ConfigError) -> Self {
        Self::ConfigError(value)
    }
}

/// A stage in the SoundScope pipeline, which performs one step of the
/// level extraction or direction blending process. All structs that
/// perform a processing step must implement Component, so that they can
/// be chained over channels into the pipeline.
pub trait Component: fmt::Display {
    /// What the stage consumes.
    type InData;
    /// What the stage produces.
    type OutData;

    /// Converts one input into at most one output. `Ok(None)` means this
    /// input produced nothing to pass along; an `Err` is fatal to the
    /// stage.
    fn convert(&mut self, input: Self::InData) -> Result<Option<Self::OutData>, ComponentError>;

    /// Cleans up at termination of the pipeline.
    fn finalize(&mut self) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// Runs the given Component on its own thread. On receiving data on the
/// input channel, the Component converts it and sends the result to the
/// output channel. The thread winds down when its input channel closes,
/// when everything downstream has hung up, or on a fatal convert error.
pub fn run_component<C: Component + Send + 'static>(
    mut component: C,
    input: Receiver<C::InData>,
    output: Sender<C::OutData>,
) -> JoinHandle<()>
where
    C::InData: Send + 'static,
    C::OutData: Send + 'static,
{
    thread::spawn(move || {
        while let Ok(data) = input.recv() {
            match component.convert(data) {
                Ok(Some(out_data)) => {
                    if output.send(out_data).is_err() {
                        // Receiver gone; nothing left to feed.
                        break;
                    }
                }
                Ok(None) => {}
                Err(component_error) => {
                    error!("{} : fatal error : {}.", component, component_error);
                    break;
                }
            }
        }

        if let Err(component_error) = component.finalize() {
            warn!("{} : error during terminating : {component_error}.", component);
        }
        info!("{} : terminated.", component);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    /// Increments non-negative inputs, swallows negative ones.
    struct MockComponent {}

    impl MockComponent {
        fn new() -> Self {
            Self {}
        }
    }

    impl Component for MockComponent {
        type InData = i32;
        type OutData = i32;

        fn convert(&mut self, input: i32) -> Result<Option<i32>, ComponentError> {
            if input >= 0 {
                Ok(Some(input + 1))
            } else {
                Ok(None)
            }
        }
    }

    impl fmt::Display for MockComponent {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "MockComponent")
        }
    }

    /// Checks that a Component's generic input and output types can be
    /// specified. Checks that writing a value to the Component's input
    /// produces that value, converted, in the Component's output.
    #[test]
    fn test_mock_component() {
        let mock_comp = MockComponent::new();
        let (test_tx, stage_rx) = channel::<i32>();
        let (stage_tx, test_rx) = channel::<i32>();

        run_component(mock_comp, stage_rx, stage_tx);

        assert_eq!(test_tx.send(0), Ok(()));
        assert_eq!(test_rx.recv(), Ok(1));
    }

    /// Checks that two Components chain output-to-input and that
    /// swallowed values never reach the far side.
    #[test]
    fn test_chained_component() {
        let mock_comp_a = MockComponent::new();
        let mock_comp_b = MockComponent::new();

        let (test_tx, stage_a_rx) = channel::<i32>();
        let (stage_a_tx, stage_b_rx) = channel::<i32>();
        let (stage_b_tx, test_rx) = channel::<i32>();

        run_component(mock_comp_a, stage_a_rx, stage_a_tx);
        run_component(mock_comp_b, stage_b_rx, stage_b_tx);

        assert_eq!(test_tx.send(-4), Ok(()));
        assert_eq!(test_tx.send(0), Ok(()));
        drop(test_tx);

        // The negative input is swallowed by the first stage, so the
        // only thing to arrive is 0 incremented twice.
        assert_eq!(test_rx.recv(), Ok(2));
        assert!(test_rx.recv().is_err());
    }
}
