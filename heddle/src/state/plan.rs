//! Plan structure shared by the planning strategies: a DAG of tool steps.
//!
//! Planners emit JSON `{"steps":[{"id":1,"tool":"search","args":{..},"depends_on":[]}]}`,
//! usually wrapped in prose or a code fence. `Plan::parse` extracts the object,
//! `Plan::validate` rejects duplicate ids, dangling dependencies and cycles.
//! Callers recover from any `PlanError` with `Plan::fallback`.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// One planned unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: u32,
    pub tool: String,
    #[serde(default)]
    pub args: Map<String, Value>,
    #[serde(default)]
    pub depends_on: Vec<u32>,
    #[serde(default)]
    pub description: String,
}

impl Step {
    pub fn new(id: u32, tool: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            id,
            tool: tool.into(),
            args,
            depends_on: Vec::new(),
            description: String::new(),
        }
    }

    pub fn depends_on(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.depends_on = ids.into_iter().collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Ordered list of steps; `depends_on` edges must form a DAG over ids in the plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<Step>,
}

/// Why a planner output could not be used as a plan.
#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    #[error("no JSON object in planner output")]
    NoJson,
    #[error("invalid plan JSON: {0}")]
    Json(String),
    #[error("plan has no steps")]
    Empty,
    #[error("duplicate step id: {0}")]
    DuplicateStepId(u32),
    #[error("step {step} depends on unknown step {missing}")]
    UnknownDependency { step: u32, missing: u32 },
    #[error("dependency cycle among steps {0:?}")]
    Cycle(Vec<u32>),
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    /// Single step with `tool` seeded with the raw query. Used when planning fails.
    pub fn fallback(tool: &str, query: &str) -> Self {
        let mut args = Map::new();
        args.insert("query".to_string(), Value::String(query.to_string()));
        Self {
            steps: vec![Step::new(1, tool, args).with_description(query)],
        }
    }

    /// Extracts and validates a plan from raw model output.
    pub fn parse(raw: &str) -> Result<Self, PlanError> {
        #[derive(Deserialize)]
        struct RawPlan {
            #[serde(default)]
            steps: Vec<Step>,
        }

        let json = extract_json_object(raw).ok_or(PlanError::NoJson)?;
        let parsed: RawPlan =
            serde_json::from_str(json).map_err(|e| PlanError::Json(e.to_string()))?;
        let plan = Self {
            steps: parsed.steps,
        };
        plan.validate()?;
        Ok(plan)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, id: u32) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.steps.iter().map(|s| s.id)
    }

    pub fn max_id(&self) -> u32 {
        self.ids().max().unwrap_or(0)
    }

    /// Checks ids are unique, dependencies exist and the graph is acyclic.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.steps.is_empty() {
            return Err(PlanError::Empty);
        }
        let mut ids = HashSet::new();
        for step in &self.steps {
            if !ids.insert(step.id) {
                return Err(PlanError::DuplicateStepId(step.id));
            }
        }
        for step in &self.steps {
            if let Some(&missing) = step.depends_on.iter().find(|d| !ids.contains(d)) {
                return Err(PlanError::UnknownDependency {
                    step: step.id,
                    missing,
                });
            }
        }
        let sorted: HashSet<u32> = self.kahn_order().into_iter().collect();
        if sorted.len() == ids.len() {
            return Ok(());
        }
        let mut cyclic: Vec<u32> = self.ids().filter(|id| !sorted.contains(id)).collect();
        cyclic.sort_unstable();
        Err(PlanError::Cycle(cyclic))
    }

    /// Topological order of step ids. Returns None when the plan has a cycle.
    pub fn topological_order(&self) -> Option<Vec<u32>> {
        let order = self.kahn_order();
        (order.len() == self.steps.len()).then_some(order)
    }

    /// Kahn's algorithm over `depends_on`; ties broken by plan order. Steps on a
    /// cycle (or behind one) never reach in-degree zero and are left out.
    fn kahn_order(&self) -> Vec<u32> {
        let ids: HashSet<u32> = self.ids().collect();
        let mut in_degree: HashMap<u32, usize> = ids.iter().map(|&id| (id, 0)).collect();
        let mut dependents: HashMap<u32, Vec<u32>> = HashMap::new();
        for step in &self.steps {
            for dep in step.depends_on.iter().filter(|d| ids.contains(d)) {
                dependents.entry(*dep).or_default().push(step.id);
                if let Some(d) = in_degree.get_mut(&step.id) {
                    *d += 1;
                }
            }
        }

        let mut queue: Vec<u32> = self
            .ids()
            .filter(|id| in_degree.get(id) == Some(&0))
            .collect();
        queue.reverse();
        let mut order = Vec::with_capacity(ids.len());
        while let Some(u) = queue.pop() {
            order.push(u);
            for v in dependents.remove(&u).unwrap_or_default() {
                if let Some(d) = in_degree.get_mut(&v) {
                    *d -= 1;
                    if *d == 0 {
                        queue.insert(0, v);
                    }
                }
            }
        }

        order
    }

    /// Steps not yet completed whose every dependency is completed, in plan order.
    pub fn ready_steps(&self, completed: &BTreeSet<u32>) -> Vec<&Step> {
        self.steps
            .iter()
            .filter(|s| !completed.contains(&s.id))
            .filter(|s| s.depends_on.iter().all(|d| completed.contains(d)))
            .collect()
    }

    pub fn is_complete(&self, completed: &BTreeSet<u32>) -> bool {
        self.ids().all(|id| completed.contains(&id))
    }

    /// Keeps the first `max` steps. Returns true when steps were dropped.
    pub fn truncate(&mut self, max: usize) -> bool {
        if self.steps.len() > max {
            self.steps.truncate(max);
            true
        } else {
            false
        }
    }

    /// One line per step, for trace notes and prompts.
    pub fn summary(&self) -> String {
        self.steps
            .iter()
            .map(|s| {
                let deps = if s.depends_on.is_empty() {
                    String::new()
                } else {
                    format!(" after {:?}", s.depends_on)
                };
                format!("#{} {}({}){}", s.id, s.tool, Value::Object(s.args.clone()), deps)
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Returns the outermost `{...}` slice of `raw`, skipping code fences and prose.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}
