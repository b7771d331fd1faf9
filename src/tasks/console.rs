use std::io::{self, BufRead};
use std::thread;

use tokio::sync::{mpsc, watch};

use crate::core::time::format_clock;
use crate::domain::types::{QuestionType, SessionStatus, Verdict};
use crate::services::notifications::{Notification, Notifier, TracingNotifier};
use crate::services::session::SessionView;
use crate::tasks::session_driver::SessionCommand;

pub(crate) const HELP: &str = "commands: a <answer> | n | p | goto <number> | submit | restart | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ParsedLine {
    Command(SessionCommand),
    Help,
    Unknown(String),
    Empty,
}

/// Parses one line of learner input. Question numbers are 1-based on screen.
pub(crate) fn parse_command(line: &str) -> ParsedLine {
    let line = line.trim();
    if line.is_empty() {
        return ParsedLine::Empty;
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_lowercase().as_str() {
        "n" | "next" if rest.is_empty() => SessionCommand::Next,
        "p" | "prev" | "previous" if rest.is_empty() => SessionCommand::Previous,
        "goto" | "g" => match rest.parse::<usize>() {
            Ok(number) if number >= 1 => SessionCommand::JumpTo(number - 1),
            _ => return ParsedLine::Unknown(line.to_string()),
        },
        "a" | "answer" if !rest.is_empty() => SessionCommand::AnswerCurrent(rest.to_string()),
        "submit" if rest.is_empty() => SessionCommand::Submit,
        "restart" if rest.is_empty() => SessionCommand::Restart,
        "quit" | "exit" | "leave" => SessionCommand::Leave,
        "help" | "?" => return ParsedLine::Help,
        _ => return ParsedLine::Unknown(line.to_string()),
    };

    ParsedLine::Command(command)
}

/// Reads stdin on a plain thread so a blocked read never holds up runtime shutdown.
/// The thread ends at EOF or once the driver stops listening.
pub(crate) fn spawn_input_reader(commands: mpsc::Sender<SessionCommand>) -> io::Result<()> {
    thread::Builder::new().name("exam-console-input".to_string()).spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to read console input");
                    break;
                }
            };

            match parse_command(&line) {
                ParsedLine::Command(command) => {
                    let leaving = command == SessionCommand::Leave;
                    if commands.blocking_send(command).is_err() || leaving {
                        break;
                    }
                }
                ParsedLine::Help => println!("{HELP}"),
                ParsedLine::Unknown(input) => println!("unknown command: {input}\n{HELP}"),
                ParsedLine::Empty => {}
            }
        }
        tracing::debug!("console input closed");
    })?;
    Ok(())
}

/// Redraws the screen whenever something the learner can see changes.
/// The countdown is only reprinted on whole minutes and over the last ten seconds.
pub(crate) async fn render_views(mut views: watch::Receiver<SessionView>) {
    let mut last: Option<SessionView> = None;

    loop {
        let view = views.borrow_and_update().clone();
        if should_redraw(last.as_ref(), &view) {
            println!("{}", render(&view));
        } else if should_print_clock(last.as_ref(), &view) {
            println!("time left {}", format_clock(view.remaining_seconds));
        }
        last = Some(view);

        if views.changed().await.is_err() {
            break;
        }
    }
}

fn should_redraw(last: Option<&SessionView>, view: &SessionView) -> bool {
    let Some(last) = last else {
        return true;
    };
    last.status != view.status
        || last.attempt_id != view.attempt_id
        || last.current_index != view.current_index
        || last.current_answer != view.current_answer
}

fn should_print_clock(last: Option<&SessionView>, view: &SessionView) -> bool {
    if view.status != SessionStatus::InProgress {
        return false;
    }
    let changed = last.map_or(true, |last| last.remaining_seconds != view.remaining_seconds);
    changed && (view.remaining_seconds % 60 == 0 || view.remaining_seconds <= 10)
}

pub(crate) fn render(view: &SessionView) -> String {
    let mut out = String::new();
    match view.status {
        SessionStatus::Loading => {
            out.push_str(&format!("Loading {}...", view.exam_title));
        }
        SessionStatus::InProgress => {
            out.push_str(&format!(
                "== {} == question {}/{} | answered {} | time left {}\n",
                view.exam_title,
                view.current_index + 1,
                view.question_count,
                view.answered_count,
                format_clock(view.remaining_seconds),
            ));
            if let Some(question) = &view.question {
                out.push_str(&question.content);
                out.push('\n');
                match question.question_type {
                    QuestionType::MultipleChoice => {
                        for option in &question.options {
                            out.push_str(&format!("  - {option}\n"));
                        }
                    }
                    QuestionType::TrueFalse => out.push_str("  (true / false)\n"),
                    QuestionType::FillBlank => {}
                }
            }
            out.push_str(&format!(
                "your answer: {}",
                view.current_answer.as_deref().unwrap_or("-")
            ));
        }
        SessionStatus::Submitted => {
            if let Some(outcome) = &view.outcome {
                out.push_str(&format!(
                    "== {} submitted ({}) ==\nscore {}% | correct {} | wrong {} | answered {}/{} | time spent {}\n",
                    view.exam_title,
                    outcome.mode.as_str(),
                    outcome.score.percentage,
                    outcome.score.correct_count,
                    outcome.score.wrong_count,
                    outcome.score.answered_count,
                    view.question_count,
                    format_clock(outcome.time_spent_seconds),
                ));
                for (number, review) in outcome.review.iter().enumerate() {
                    let mark = match review.verdict {
                        Verdict::Correct => "correct",
                        Verdict::Wrong => "wrong",
                        Verdict::Unanswered => "unanswered",
                    };
                    out.push_str(&format!(
                        "  {}. {mark}: {} (expected {})\n",
                        number + 1,
                        review.response.as_deref().unwrap_or("-"),
                        review.canonical_answer,
                    ));
                }
            }
            out.push_str("type `restart` to try again or `quit` to leave");
        }
        SessionStatus::Cancelled => out.push_str("Left the exam."),
    }
    out
}

/// Shows notices on the terminal and keeps them in the log stream.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ConsoleNotifier {
    log: TracingNotifier,
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("! {notification}");
        self.log.notify(notification);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::types::{NavigationPolicy, SubmitMode};
    use crate::services::session::ExamSession;
    use crate::test_support::sample_exam;

    #[test]
    fn parses_navigation_commands() {
        assert_eq!(parse_command("n"), ParsedLine::Command(SessionCommand::Next));
        assert_eq!(parse_command("  NEXT "), ParsedLine::Command(SessionCommand::Next));
        assert_eq!(parse_command("prev"), ParsedLine::Command(SessionCommand::Previous));
        assert_eq!(parse_command("goto 3"), ParsedLine::Command(SessionCommand::JumpTo(2)));
        assert_eq!(parse_command("goto 0"), ParsedLine::Unknown("goto 0".to_string()));
        assert_eq!(parse_command("goto x"), ParsedLine::Unknown("goto x".to_string()));
    }

    #[test]
    fn parses_answers_with_inner_spaces() {
        assert_eq!(
            parse_command("a  New York "),
            ParsedLine::Command(SessionCommand::AnswerCurrent("New York".to_string()))
        );
        assert_eq!(parse_command("answer"), ParsedLine::Unknown("answer".to_string()));
    }

    #[test]
    fn parses_lifecycle_commands() {
        assert_eq!(parse_command("submit"), ParsedLine::Command(SessionCommand::Submit));
        assert_eq!(parse_command("restart"), ParsedLine::Command(SessionCommand::Restart));
        assert_eq!(parse_command("quit"), ParsedLine::Command(SessionCommand::Leave));
        assert_eq!(parse_command("exit"), ParsedLine::Command(SessionCommand::Leave));
        assert_eq!(parse_command("?"), ParsedLine::Help);
        assert_eq!(parse_command("   "), ParsedLine::Empty);
    }

    #[test]
    fn renders_question_screen() {
        let session = ExamSession::start(Arc::new(sample_exam()), NavigationPolicy::Free);
        let screen = render(&session.view());

        assert!(screen.contains("question 1/3"));
        assert!(screen.contains("time left 01:00"));
        assert!(screen.contains("  - B"));
        assert!(screen.ends_with("your answer: -"));
    }

    #[test]
    fn renders_score_and_review_after_submission() {
        let mut session = ExamSession::start(Arc::new(sample_exam()), NavigationPolicy::Free);
        session.answer("q1", "B");
        session.answer("q2", "false");
        session.submit(SubmitMode::Manual);

        let screen = render(&session.view());
        assert!(screen.contains("submitted (manual)"));
        assert!(screen.contains("score 33%"));
        assert!(screen.contains("1. correct: B (expected B)"));
        assert!(screen.contains("2. wrong: false (expected true)"));
        assert!(screen.contains("3. unanswered: - (expected Paris)"));
    }

    #[test]
    fn clock_is_reprinted_on_minutes_and_final_seconds() {
        let session = ExamSession::start(Arc::new(sample_exam()), NavigationPolicy::Free);
        let mut last = session.view();
        let mut view = last.clone();

        view.remaining_seconds = 45;
        assert!(!should_print_clock(Some(&last), &view));
        last.remaining_seconds = 11;
        view.remaining_seconds = 10;
        assert!(should_print_clock(Some(&last), &view));
        assert!(!should_redraw(Some(&last), &view));
    }
}
