use std::any::type_name;

use crate::error::Error;

/// One configuration step: updates a destination in place.
///
/// Values the step has no data for stay as they are, so steps layer on top of
/// each other in the order a [`Flow`](crate::Flow) runs them.
pub trait Decoder<T> {
    fn decode(&self, config: &mut T) -> Result<(), Error>;

    /// Short label used in log output.
    fn describe(&self) -> String {
        type_name::<Self>().to_string()
    }
}

impl<T, F> Decoder<T> for F
where
    F: Fn(&mut T) -> Result<(), Error>,
{
    fn decode(&self, config: &mut T) -> Result<(), Error> {
        self(config)
    }

    fn describe(&self) -> String {
        "closure".to_string()
    }
}
