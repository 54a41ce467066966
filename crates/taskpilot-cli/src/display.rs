//! Terminal rendering helpers

use console::style;
use taskpilot_core::tools::ToolDefinition;
use taskpilot_core::{Task, TaskStatus};

pub fn print_task(task: &Task) {
    let marker = match task.status {
        TaskStatus::Completed => style("[x]").green(),
        TaskStatus::Pending => style("[ ]").yellow(),
    };
    println!("  {} {} {}", marker, style(format!("#{}", task.id)).dim(), task.title);
    if let Some(desc) = task.description.as_deref().filter(|d| !d.is_empty()) {
        println!("        {}", style(desc).dim());
    }
}

pub fn print_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("  {}", style("No tasks").dim());
        return;
    }
    for task in tasks {
        print_task(task);
    }
}

pub fn print_tools(tools: &[ToolDefinition]) {
    println!("{}", style("Available Tools:").bold());
    println!();
    for tool in tools {
        println!("  {}", style(&tool.name).cyan());
        println!("    {}", tool.description);
        let required: Vec<&str> = tool.parameters["required"]
            .as_array()
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default();
        if let Some(props) = tool.parameters["properties"].as_object() {
            for (name, schema) in props {
                let kind = schema["type"].as_str().unwrap_or("any");
                let flag = if required.contains(&name.as_str()) {
                    style("required").red()
                } else {
                    style("optional").dim()
                };
                println!("      {} ({}, {})", name, kind, flag);
            }
        }
    }
}

pub fn print_answer(text: &str) {
    println!("{}: {}", style("Assistant").bold().green(), text);
}

pub fn print_error(err: &dyn std::fmt::Display) {
    eprintln!("{}", style(format!("Error: {}", err)).red());
}
