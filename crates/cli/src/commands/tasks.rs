//! `tasks` command implementation.

use anyhow::{Context, Result};
use contracts::TASK_TABLE;
use orchestrator::{image_prompt, ANALYSIS_PROMPT};
use serde::Serialize;

use crate::cli::TasksArgs;

/// One pipeline step for display
#[derive(Serialize)]
struct TaskInfo {
    step: usize,
    field: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    age: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<String>,
}

/// Execute the `tasks` command
pub fn run_tasks(args: &TasksArgs) -> Result<()> {
    let tasks = collect_tasks(args.prompts);

    if args.json {
        let json = serde_json::to_string_pretty(&tasks).context("Failed to serialize task table")?;
        println!("{}", json);
    } else {
        print_tasks(&tasks);
    }

    Ok(())
}

fn collect_tasks(with_prompts: bool) -> Vec<TaskInfo> {
    let analysis = TaskInfo {
        step: 0,
        field: contracts::ANALYSIS_FIELD,
        gender: None,
        age: None,
        prompt: with_prompts.then(|| ANALYSIS_PROMPT.to_string()),
    };

    let images = TASK_TABLE.iter().enumerate().map(|(i, task)| TaskInfo {
        step: i + 1,
        field: task.slot.field_name(),
        gender: Some(task.gender.as_str()),
        age: Some(task.age_band.as_str()),
        prompt: with_prompts.then(|| image_prompt(task)),
    });

    std::iter::once(analysis).chain(images).collect()
}

fn print_tasks(tasks: &[TaskInfo]) {
    println!("\n=== Pipeline Steps ===\n");
    for task in tasks {
        match (task.gender, task.age) {
            (Some(gender), Some(age)) => {
                println!("  {}. {:<12} {} / {}", task.step, task.field, gender, age)
            }
            _ => println!("  {}. {:<12} trait analysis", task.step, task.field),
        }
        if let Some(ref prompt) = task.prompt {
            println!("       {}", prompt);
        }
    }
    println!();
}
