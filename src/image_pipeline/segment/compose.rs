use tracing::{debug, info_span};

use crate::image_pipeline::common::error::Result;
use crate::image_pipeline::segment::Value;

/// A pipeline stage.
///
/// Source stages (loaders) ignore their input and are normally driven
/// through [`Segment::produce`]. Transform stages consume the value
/// produced by the stage before them.
pub trait Segment {
    fn transform(&self, input: Value) -> Result<Value>;

    /// Runs the segment with no upstream input.
    fn produce(&self) -> Result<Value> {
        self.transform(Value::None)
    }

    /// Name used in log spans.
    fn label(&self) -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl Segment for Box<dyn Segment> {
    fn transform(&self, input: Value) -> Result<Value> {
        (**self).transform(input)
    }

    fn label(&self) -> &'static str {
        (**self).label()
    }
}

fn run_stage(segment: &dyn Segment, input: Value) -> Result<Value> {
    let _span = info_span!("segment", stage = segment.label()).entered();
    debug!(input = input.kind(), "running stage");
    let output = segment.transform(input)?;
    debug!(output = output.kind(), "stage complete");
    Ok(output)
}

/// Two segments run back to back, the output of the first feeding the second.
pub struct Chain {
    first: Box<dyn Segment>,
    second: Box<dyn Segment>,
}

impl Chain {
    /// Executes the whole chain from its source.
    pub fn run(&self) -> Result<Value> {
        self.produce()
    }
}

impl Segment for Chain {
    fn transform(&self, input: Value) -> Result<Value> {
        let intermediate = run_stage(self.first.as_ref(), input)?;
        run_stage(self.second.as_ref(), intermediate)
    }

    fn label(&self) -> &'static str {
        "Chain"
    }
}

/// Chains `first` then `second`.
pub fn compose<A, B>(first: A, second: B) -> Chain
where
    A: Segment + 'static,
    B: Segment + 'static,
{
    Chain {
        first: Box::new(first),
        second: Box::new(second),
    }
}

/// Neutral element of composition: returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Segment for Identity {
    fn transform(&self, input: Value) -> Result<Value> {
        Ok(input)
    }
}

/// Runs several branches on the same input and gathers their outputs.
///
/// Each branch receives a clone of the input. Branch outputs are collected
/// into one [`Value::Tuple`] in branch order; a branch that itself returns a
/// tuple has its items spliced in rather than nested.
pub struct Merge {
    branches: Vec<Box<dyn Segment>>,
}

impl Merge {
    pub fn new<A, B>(first: A, second: B) -> Self
    where
        A: Segment + 'static,
        B: Segment + 'static,
    {
        Self {
            branches: vec![Box::new(first), Box::new(second)],
        }
    }

    pub fn from_branches(branches: Vec<Box<dyn Segment>>) -> Self {
        Self { branches }
    }

    pub fn branch<S: Segment + 'static>(mut self, segment: S) -> Self {
        self.branches.push(Box::new(segment));
        self
    }

    pub fn run(&self) -> Result<Value> {
        self.produce()
    }
}

impl Segment for Merge {
    fn transform(&self, input: Value) -> Result<Value> {
        let mut items = Vec::with_capacity(self.branches.len());
        for branch in &self.branches {
            match run_stage(branch.as_ref(), input.clone())? {
                Value::Tuple(values) => items.extend(values),
                value => items.push(value),
            }
        }
        Ok(Value::Tuple(items))
    }

    fn label(&self) -> &'static str {
        "Merge"
    }
}

/// Fluent composition helpers available on every sized segment.
pub trait SegmentExt: Segment + Sized + 'static {
    fn then<S: Segment + 'static>(self, next: S) -> Chain {
        compose(self, next)
    }

    fn alongside<S: Segment + 'static>(self, other: S) -> Merge {
        Merge::new(self, other)
    }

    fn boxed(self) -> Box<dyn Segment> {
        Box::new(self)
    }
}

impl<T: Segment + Sized + 'static> SegmentExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::common::error::PipelineError;

    struct Constant(&'static str);

    impl Segment for Constant {
        fn transform(&self, _input: Value) -> Result<Value> {
            Ok(Value::from(self.0))
        }
    }

    struct Append(&'static str);

    impl Segment for Append {
        fn transform(&self, input: Value) -> Result<Value> {
            match input {
                Value::Text(text) => Ok(Value::Text(text + self.0)),
                other => Err(PipelineError::InvalidInput {
                    stage: "Append",
                    expected: "text",
                    found: other.kind(),
                }),
            }
        }
    }

    struct Fail;

    impl Segment for Fail {
        fn transform(&self, _input: Value) -> Result<Value> {
            Err(PipelineError::Render("boom".into()))
        }
    }

    #[test]
    fn test_chain_runs_in_order() {
        let pipeline = Constant("a").then(Append("b")).then(Append("c"));
        assert_eq!(pipeline.run().unwrap(), Value::from("abc"));
    }

    #[test]
    fn test_identity_is_neutral() {
        let plain = Constant("a").then(Append("b")).run().unwrap();
        let right = Constant("a").then(Append("b")).then(Identity).run().unwrap();
        let left = Constant("a").then(Identity).then(Append("b")).run().unwrap();
        assert_eq!(plain, right);
        assert_eq!(plain, left);
    }

    #[test]
    fn test_composition_is_associative() {
        let left = compose(compose(Constant("a"), Append("b")), Append("c"));
        let right = compose(Constant("a"), compose(Append("b"), Append("c")));
        assert_eq!(left.run().unwrap(), right.run().unwrap());
    }

    #[test]
    fn test_failure_aborts_chain() {
        let pipeline = Constant("a").then(Fail).then(Append("never"));
        assert!(matches!(pipeline.run(), Err(PipelineError::Render(_))));
    }

    #[test]
    fn test_merge_flattens_tuples() {
        let inner = Merge::new(Constant("x"), Constant("y"));
        let merged = Constant("w").alongside(inner).branch(Constant("z"));
        assert_eq!(
            merged.run().unwrap(),
            Value::Tuple(vec![
                Value::from("w"),
                Value::from("x"),
                Value::from("y"),
                Value::from("z"),
            ])
        );
    }

    #[test]
    fn test_merge_feeds_each_branch_the_same_input() {
        let merged = Constant("a").then(Append("1").alongside(Append("2")));
        assert_eq!(
            merged.run().unwrap(),
            Value::Tuple(vec![Value::from("a1"), Value::from("a2")])
        );
    }

    #[test]
    fn test_label_strips_module_path() {
        assert_eq!(Identity.label(), "Identity");
        assert_eq!(Identity.boxed().label(), "Identity");
    }
}
