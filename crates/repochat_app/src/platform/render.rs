use repochat_core::{AppViewModel, ChatView, JobState, Sender};

const PROGRESS_BAR_WIDTH: usize = 20;
const TRANSCRIPT_TAIL: usize = 6;

pub fn render(view: &AppViewModel) -> String {
    let mut lines = Vec::new();
    render_ingestion(view, &mut lines);
    render_directory(view, &mut lines);
    for chat in &view.chats {
        render_chat(chat, &mut lines);
    }
    lines.join("\n")
}

fn render_ingestion(view: &AppViewModel, lines: &mut Vec<String>) {
    let ingestion = &view.ingestion;
    let job = &ingestion.job;
    if job.state != JobState::Idle {
        lines.push(format!("Ingestion [{}] {}", state_label(job.state), job.source_url));
        lines.push(format!("  {} {}", progress_bar(job.progress), job.status));
        if let Some(detail) = &job.detail {
            lines.push(format!("  detail: {detail}"));
        }
    }
    if let Some(feedback) = &ingestion.feedback {
        lines.push(format!("  {feedback}"));
    }
}

fn render_directory(view: &AppViewModel, lines: &mut Vec<String>) {
    let directory = &view.directory;
    lines.push("Project Overview".to_string());
    if directory.loading {
        lines.push("  Loading projects...".to_string());
    }
    if let Some(error) = &directory.error {
        lines.push(format!("  ! {error}"));
    }
    if directory.projects.is_empty() && !directory.loading {
        lines.push("  (no projects)".to_string());
    }
    for project in &directory.projects {
        lines.push(format!("  - {}", project.name));
    }
}

fn render_chat(chat: &ChatView, lines: &mut Vec<String>) {
    let suffix = if chat.pending { " (waiting for answer...)" } else { "" };
    lines.push(format!("Chat: {}{}", chat.project, suffix));
    let skip = chat.transcript.len().saturating_sub(TRANSCRIPT_TAIL);
    for message in chat.transcript.iter().skip(skip) {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Bot => "bot",
        };
        lines.push(format!("  {who}> {}", message.text));
    }
    if let Some(notice) = &chat.notice {
        lines.push(format!("  {notice}"));
    }
}

fn state_label(state: JobState) -> &'static str {
    match state {
        JobState::Idle => "Idle",
        JobState::Connecting => "Connecting",
        JobState::Running => "Running",
        JobState::Succeeded => "Succeeded",
        JobState::Failed => "Failed",
    }
}

fn progress_bar(progress: u8) -> String {
    let progress = usize::from(progress.min(100));
    let filled = progress * PROGRESS_BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_BAR_WIDTH - filled),
        progress
    )
}
