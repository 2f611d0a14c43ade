use std::fmt;

use tracing::{debug, warn};

use crate::builder::FlowBuilder;
use crate::decoder::Decoder;
use crate::error::Error;

/// An ordered list of decoding steps applied to one configuration value.
///
/// The flow starts from the defaults it is given; each step overrides what it
/// has data for, so later steps take precedence over earlier ones. Running the
/// flow again re-applies every step on top of the current value.
pub struct Flow<T> {
    config: T,
    steps: Vec<Box<dyn Decoder<T>>>,
}

impl<T> Flow<T> {
    pub fn new(defaults: T) -> Self {
        Self::with_steps(defaults, Vec::new())
    }

    pub fn with_steps(defaults: T, steps: Vec<Box<dyn Decoder<T>>>) -> Self {
        Self {
            config: defaults,
            steps,
        }
    }

    /// Start a [`FlowBuilder`] from `defaults`.
    pub fn builder(defaults: T) -> FlowBuilder<T> {
        FlowBuilder::new(defaults)
    }

    /// Append a step after the existing ones.
    pub fn push(&mut self, step: impl Decoder<T> + 'static) {
        self.steps.push(Box::new(step));
    }

    /// Run every step in order.
    ///
    /// With `fail_fast` the first failure stops the run and is the only error
    /// returned. Otherwise every step runs and all failures are returned in
    /// step order. Changes made by steps before a failure are kept.
    pub fn run(&mut self, fail_fast: bool) -> Vec<Error> {
        let mut errors = Vec::new();
        for (index, step) in self.steps.iter().enumerate() {
            let name = step.describe();
            debug!(step = index, %name, "running decoding step");
            if let Err(err) = step.decode(&mut self.config) {
                warn!(step = index, %name, error = %err, "decoding step failed");
                errors.push(err);
                if fail_fast {
                    break;
                }
            }
        }
        errors
    }

    /// Run every step, collecting all failures. Empty means success.
    pub fn load(&mut self) -> Vec<Error> {
        self.run(false)
    }

    /// Run the steps until one fails.
    pub fn load_fail_fast(&mut self) -> Result<(), Error> {
        match self.run(true).into_iter().next() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    pub fn config(&self) -> &T {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut T {
        &mut self.config
    }

    pub fn into_config(self) -> T {
        self.config
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for Flow<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<String> = self.steps.iter().map(|step| step.describe()).collect();
        f.debug_struct("Flow")
            .field("config", &self.config)
            .field("steps", &steps)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EnvSource;
    use crate::file::FileDecoder;
    use crate::fixtures::test::Cfg;
    use crate::source::KvDecoder;
    use crate::types::Format;
    use std::cell::Cell;
    use std::fs;
    use std::path::PathBuf;
    use std::rc::Rc;
    use tempfile::TempDir;

    fn env() -> KvDecoder<EnvSource> {
        KvDecoder::new(EnvSource::from_vars(vec![
            ("NUMBER".to_string(), "-987".to_string()),
            ("STR2".to_string(), "asd-987".to_string()),
        ]))
    }

    fn files(dir: &TempDir) -> (PathBuf, PathBuf) {
        let yaml = dir.path().join("test.yml");
        fs::write(&yaml, "number: 987654321\nstr1: aasd\n").unwrap();
        let json = dir.path().join("test.json");
        fs::write(&json, r#"{"number": -17, "flag": false}"#).unwrap();
        (yaml, json)
    }

    #[test]
    fn empty_flow_keeps_defaults() {
        let mut flow = Flow::new(Cfg::defaults());
        assert!(flow.is_empty());
        flow.load_fail_fast().unwrap();
        assert_eq!(*flow.config(), Cfg::defaults());
    }

    #[test]
    fn env_flow() {
        let mut flow = Flow::new(Cfg::defaults());
        flow.push(env());
        flow.load_fail_fast().unwrap();

        let mut expected = Cfg::defaults();
        expected.number = -987;
        expected.str2 = "asd-987".into();
        assert_eq!(flow.into_config(), expected);
    }

    #[test]
    fn yaml_file_flow() {
        let dir = TempDir::new().unwrap();
        let (yaml, _) = files(&dir);
        let mut flow = Flow::new(Cfg::defaults());
        flow.push(FileDecoder::new(yaml, Format::Yaml));
        flow.load_fail_fast().unwrap();

        let mut expected = Cfg::defaults();
        expected.number = 987654321;
        expected.str1 = "aasd".into();
        assert_eq!(*flow.config(), expected);
    }

    #[test]
    fn json_file_flow() {
        let dir = TempDir::new().unwrap();
        let (_, json) = files(&dir);
        let mut flow = Flow::new(Cfg::defaults());
        flow.push(FileDecoder::new(json, Format::Json));
        flow.load_fail_fast().unwrap();

        let mut expected = Cfg::defaults();
        expected.number = -17;
        expected.flag = false;
        assert_eq!(*flow.config(), expected);
    }

    #[test]
    fn later_steps_override_earlier_ones() {
        let dir = TempDir::new().unwrap();
        let (yaml, json) = files(&dir);
        let steps: Vec<Box<dyn Decoder<Cfg>>> = vec![
            Box::new(FileDecoder::new(yaml, Format::Yaml)),
            Box::new(FileDecoder::new(json, Format::Json)),
            Box::new(env()),
        ];
        let mut flow = Flow::with_steps(Cfg::defaults(), steps);
        assert_eq!(flow.len(), 3);
        flow.load_fail_fast().unwrap();

        let expected = Cfg {
            number: -987,
            flag: false,
            str1: "aasd".into(),
            str2: "asd-987".into(),
        };
        assert_eq!(*flow.config(), expected);
    }

    // -- Error collection ----------------------------------------------------

    struct Unit;

    fn counter(count: &Rc<Cell<usize>>) -> impl Fn(&mut Unit) -> Result<(), Error> + 'static {
        let count = Rc::clone(count);
        move |_: &mut Unit| -> Result<(), Error> {
            count.set(count.get() + 1);
            Ok(())
        }
    }

    fn fail(msg: &'static str) -> impl Fn(&mut Unit) -> Result<(), Error> + 'static {
        move |_: &mut Unit| -> Result<(), Error> { Err(Error::custom(msg)) }
    }

    fn messages(errors: &[Error]) -> Vec<String> {
        errors.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn single_counting_step() {
        let count = Rc::new(Cell::new(0));
        let mut flow = Flow::new(Unit);
        flow.push(counter(&count));
        assert!(flow.load().is_empty());
        assert_eq!(count.get(), 1);
        flow.load_fail_fast().unwrap();
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn failure_before_counter() {
        let count = Rc::new(Cell::new(0));
        let mut flow = Flow::new(Unit);
        flow.push(fail("1"));
        flow.push(counter(&count));
        assert_eq!(messages(&flow.load()), vec!["1"]);
        assert_eq!(count.get(), 1);
        assert_eq!(flow.load_fail_fast().unwrap_err().to_string(), "1");
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn failures_interleaved_with_counters() {
        let count = Rc::new(Cell::new(0));
        let mut flow = Flow::new(Unit);
        flow.push(counter(&count));
        flow.push(fail("1"));
        flow.push(counter(&count));
        flow.push(fail("2"));
        flow.push(counter(&count));
        assert_eq!(messages(&flow.load()), vec!["1", "2"]);
        assert_eq!(count.get(), 3);
        assert_eq!(flow.load_fail_fast().unwrap_err().to_string(), "1");
        assert_eq!(count.get(), 4);
    }

    #[test]
    fn consecutive_failures_keep_step_order() {
        let count = Rc::new(Cell::new(0));
        let mut flow = Flow::new(Unit);
        flow.push(counter(&count));
        flow.push(fail("1"));
        flow.push(fail("3"));
        flow.push(fail("2"));
        flow.push(counter(&count));
        assert_eq!(messages(&flow.load()), vec!["1", "3", "2"]);
        assert_eq!(count.get(), 2);
        let fast = flow.run(true);
        assert_eq!(messages(&fast), vec!["1"]);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn changes_before_failure_are_kept() {
        let mut flow = Flow::new(Cfg::defaults());
        flow.push(|c: &mut Cfg| -> Result<(), Error> {
            c.number = 1;
            Ok(())
        });
        flow.push(|_: &mut Cfg| -> Result<(), Error> { Err(Error::custom("boom")) });
        assert!(flow.load_fail_fast().is_err());
        assert_eq!(flow.config().number, 1);
        flow.config_mut().number = 2;
        assert_eq!(flow.config().number, 2);
    }
}
