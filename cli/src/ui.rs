// Terminal UI utilities
// Prompts and listings used by commands

use std::io::{self, Write};

use colored::Colorize;

use crate::domain::remote::{Organisation, Project};

/// Numbered list of organisations to choose from
pub fn organisation_menu<W: Write>(out: &mut W, organisations: &[Organisation]) -> io::Result<()> {
    for (index, organisation) in organisations.iter().enumerate() {
        writeln!(out, "{}", format!("{}. {}", index + 1, organisation.name).bright_cyan())?;
    }
    Ok(())
}

pub fn selection_prompt<W: Write>(out: &mut W) -> io::Result<()> {
    write!(out, "{}", "select organisation: ".bold())?;
    out.flush()
}

pub fn invalid_choice<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(out, "{}", "invalid choice, try again".bright_yellow())
}

pub fn print_success(message: &str) {
    println!("{}", message.bright_green());
}

/// Project summary as returned by the API
pub fn project_details<W: Write>(out: &mut W, project: &Project) -> io::Result<()> {
    writeln!(out, "{}", project.name.bold())?;
    writeln!(out, "  id: {}", project.id)?;

    if let Some(url) = project.url.as_deref().filter(|url| !url.is_empty()) {
        writeln!(out, "  url: {}", url.bright_cyan())?;
    }

    if let Some(artifact) = &project.artifact {
        writeln!(out, "  artifact: {}", artifact.id)?;
        if let Some(hash) = artifact.commit_hash.as_deref().filter(|h| !h.is_empty()) {
            let message = artifact.commit_message.as_deref().unwrap_or_default();
            writeln!(out, "  commit: {} {}", hash, message)?;
        }
    }

    for variable in &project.variables {
        writeln!(out, "  {}={}", variable.key, variable.value)?;
    }
    Ok(())
}
