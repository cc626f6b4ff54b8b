use crate::dsp::stages::{Stage, StageNode};

// Pipeline holds a fixed, ordered sequence of processing stages.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    stages: Vec<StageNode>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn add_stage(&mut self, stage: impl Into<StageNode>) {
        self.stages.push(stage.into());
    }

    pub fn with_stage(mut self, stage: impl Into<StageNode>) -> Self {
        self.add_stage(stage);
        self
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(Stage::name).collect()
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let mut signal = input;

        for stage in &mut self.stages {
            signal = stage.process(signal);
        }

        signal
    }

    // process_block runs the block through every stage in order, in place.
    // Each stage sees exactly what its predecessor left in the buffer.
    pub fn process_block(&mut self, block: &mut [f32]) {
        for stage in &mut self.stages {
            stage.process_block(block);
        }
    }
}

impl FromIterator<StageNode> for Pipeline {
    fn from_iter<I: IntoIterator<Item = StageNode>>(iter: I) -> Self {
        Self {
            stages: iter.into_iter().collect(),
        }
    }
}
