//! Prompt builders shared by the strategies.
//!
//! Prompts are prepended to the model input as system messages; they are never
//! written into the conversation state.

use crate::state::{Plan, StepResult};
use crate::tool_source::ToolSpec;

/// Default system prompt for the ReAct agent; the tool guide is appended.
pub const REACT_SYSTEM_PROMPT: &str = "You are a capable assistant. Think about the request, call tools when they help, and answer directly once you have enough information.";

/// Catalog of tools plus usage rules, for agents and planners.
pub fn build_tool_guide(tools: &[ToolSpec]) -> String {
    if tools.is_empty() {
        return "No tools are available; answer from your own knowledge.".to_string();
    }
    let mut out = String::from("Available tools:\n");
    for t in tools {
        out.push_str(&format!(
            "- {}: {}\n",
            t.name,
            t.description.as_deref().unwrap_or("(no description)")
        ));
    }
    out.push_str(
        "\nRules:\n\
         - Only call tools listed above, with arguments matching their schema.\n\
         - Do not repeat an identical call; reuse earlier results.\n\
         - A result starting with \"Error:\" means the call failed; fix the arguments or try another tool.\n\
         - Search results list pages as \"URL: ...\" lines; fetch a page to read it in full.",
    );
    out
}

/// Planner prompt for ReWOO: a dependency graph of steps, JSON only.
pub fn rewoo_planner_prompt(tool_guide: &str, max_steps: usize) -> String {
    format!(
        "You are a planner. Break the user's request into at most {max_steps} tool steps without executing them.\n\n\
         {tool_guide}\n\n\
         Respond with JSON only, in this shape:\n\
         {{\"steps\": [{{\"id\": 1, \"tool\": \"<tool name>\", \"args\": {{}}, \"depends_on\": [], \"description\": \"<why>\"}}]}}\n\n\
         Ids start at 1 and increase. \"depends_on\" lists earlier step ids whose output the step needs; \
         steps that share no dependency run in parallel. To use an earlier step's output inside args, write \"#E<id>\"."
    )
}

/// Planner prompt for Plan-Execute: a strict sequence of steps, JSON only.
pub fn sequential_planner_prompt(tool_guide: &str, max_steps: usize) -> String {
    format!(
        "You are a planner. Turn the user's request into an ordered list of at most {max_steps} tool steps. \
         Steps run strictly one after another.\n\n\
         {tool_guide}\n\n\
         Respond with JSON only, in this shape:\n\
         {{\"steps\": [{{\"id\": 1, \"description\": \"<what this step does>\", \"tool\": \"<tool name>\", \"args\": {{}}}}]}}\n\n\
         To use the previous step's output inside args, write \"#E<id>\"."
    )
}

/// Replanning prompt: results so far plus the failed step.
pub fn replan_prompt(tool_guide: &str, results: &[&StepResult], max_steps: usize) -> String {
    format!(
        "{}\n\nResults so far:\n{}\n\nThe last step did not succeed. Plan the remaining work only, \
         with fresh ids starting at 1. Respond with {{\"steps\": []}} if nothing more is needed.",
        sequential_planner_prompt(tool_guide, max_steps),
        format_results(results, None)
    )
}

/// Synthesis prompt listing step results in plan order.
pub fn synthesis_prompt(plan: Option<&Plan>, results: &[&StepResult], truncated: bool) -> String {
    let mut out = format!(
        "Answer the user's request using the step results below. Be complete and cite sources when the results include them.\n\n{}",
        format_results(results, plan)
    );
    if truncated {
        out.push_str(
            "\n\nSome planned steps could not be executed; say what is missing if it matters.",
        );
    }
    out
}

fn format_results(results: &[&StepResult], plan: Option<&Plan>) -> String {
    if results.is_empty() {
        return "(no results)".to_string();
    }
    results
        .iter()
        .map(|r| {
            let description = plan
                .and_then(|p| p.step(r.step_id))
                .map(|s| s.description.as_str())
                .filter(|d| !d.is_empty())
                .unwrap_or(r.tool.as_str());
            format!("Step {}: {}\nResult: {}", r.step_id, description, r.output)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// LATS candidate generation.
pub fn candidates_prompt(n: usize) -> String {
    format!(
        "Propose {n} distinct approaches for the next action toward answering the user's request. \
         Write one approach per line, numbered 1 to {n}. Do not carry them out yet."
    )
}

/// LATS reflection over numbered candidates.
pub fn reflection_prompt(candidates: &[String]) -> String {
    let listed = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Evaluate these approaches for correctness and completeness:\n{listed}\n\n\
         Explain briefly, then end with a line of the form \"SELECTED: <number>\"."
    )
}

/// LATS execution of the chosen candidate.
pub fn execute_prompt(candidate: Option<&str>) -> String {
    match candidate {
        Some(c) => format!(
            "Carry out this approach: {c}\nUse tools when they help. When you can answer fully, give the final answer."
        ),
        None => "Continue working on the user's request. Use tools when they help.".to_string(),
    }
}

/// Appended to the execute prompt once the tool rounds of a depth are spent.
pub const TOOLS_EXHAUSTED_PROMPT: &str =
    "No more tool calls are available for this approach. Answer from the results above.";
