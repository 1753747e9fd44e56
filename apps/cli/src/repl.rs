//! 交互式 Shell
//!
//! 每行一个命令，解析成 [`TaskCommand`] 后提交到任务邮箱：
//!
//! ```text
//! hand> approach thumb,index 0.01
//! hand> push
//! hand> restore index 15
//! hand> stop
//! ```

use anyhow::{Result, bail};
use hand_protocol::{FingerName, HandSide};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::sync::atomic::{AtomicBool, Ordering};
use task_control::{TaskCommand, TaskInbox};
use tracing::warn;

/// 命令行未给出参数时使用的默认值
#[derive(Debug, Clone)]
pub struct Defaults {
    pub hand: HandSide,
    pub fingers: Vec<FingerName>,
    pub forward_speed: f64,
    pub restore_speed: f64,
}

/// 一行输入对应的动作
#[derive(Debug, Clone, PartialEq)]
pub enum ReplAction {
    Submit(TaskCommand),
    Status,
    Help,
    Quit,
}

/// 解析一行输入，空行返回 None
pub fn parse_line(line: &str, defaults: &Defaults) -> Result<Option<ReplAction>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&verb, args)) = parts.split_first() else {
        return Ok(None);
    };

    let fingers = || -> Result<Vec<FingerName>> {
        match args.first() {
            Some(list) => {
                let fingers = FingerName::parse_list(list)?;
                if fingers.is_empty() {
                    bail!("Empty finger list '{list}'");
                }
                Ok(fingers)
            },
            None => Ok(defaults.fingers.clone()),
        }
    };
    let speed = |fallback: f64| -> Result<f64> {
        match args.get(1) {
            Some(s) => Ok(s.parse::<f64>()?),
            None => Ok(fallback),
        }
    };

    let action = match verb {
        "localize" => ReplAction::Submit(TaskCommand::Localize),
        "approach" => ReplAction::Submit(TaskCommand::Approach {
            hand: defaults.hand,
            fingers: fingers()?,
            forward_speed: speed(defaults.forward_speed)?,
        }),
        "push" => ReplAction::Submit(TaskCommand::Push {
            hand: defaults.hand,
            fingers: fingers()?,
            forward_speed: speed(defaults.forward_speed)?,
        }),
        "restore" => ReplAction::Submit(TaskCommand::Restore {
            hand: defaults.hand,
            fingers: fingers()?,
            restore_speed: speed(defaults.restore_speed)?,
        }),
        "stop" => ReplAction::Submit(TaskCommand::Stop),
        "status" => ReplAction::Status,
        "help" => ReplAction::Help,
        "quit" | "exit" => ReplAction::Quit,
        other => bail!("Unknown command '{other}' (type 'help')"),
    };
    Ok(Some(action))
}

fn print_help() {
    println!("Commands:");
    println!("  localize                          enable visual localization");
    println!("  approach [fingers] [speed m/s]    move arm to the object, close fingers until contact");
    println!("  push [fingers] [speed m/s]        push the object while keeping contact");
    println!("  restore [fingers] [speed deg/s]   reopen fingers, then move the arm back");
    println!("  stop                              stop everything and roll back");
    println!("  status                            show task status");
    println!("  quit                              exit");
    println!("Fingers are comma separated, e.g. thumb,index,middle");
}

fn print_status(inbox: &TaskInbox) {
    let status = inbox.status();
    let hand = status.hand.map_or("-", HandSide::as_str);
    println!(
        "phase={} hand={} approach_done={} context_held={}",
        status.phase, hand, status.approach_done, status.context_held
    );
    if let Some(err) = &status.last_error {
        println!("last error: {err}");
    }
}

/// 运行 Shell，直到 quit/EOF 或 `running` 被清除
pub fn run(inbox: &TaskInbox, defaults: &Defaults, running: &AtomicBool) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("hand-cli v{} - type 'help' for commands", env!("CARGO_PKG_VERSION"));

    while running.load(Ordering::Acquire) {
        let line = match rl.readline("hand> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C 视为 stop
                if let Err(e) = inbox.submit(TaskCommand::Stop) {
                    warn!(error = %e, "Stop rejected");
                }
                continue;
            },
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let _ = rl.add_history_entry(line.as_str());

        match parse_line(&line, defaults) {
            Ok(None) => {},
            Ok(Some(ReplAction::Submit(command))) => {
                if let Err(e) = inbox.submit(command) {
                    println!("rejected: {e}");
                }
            },
            Ok(Some(ReplAction::Status)) => print_status(inbox),
            Ok(Some(ReplAction::Help)) => print_help(),
            Ok(Some(ReplAction::Quit)) => break,
            Err(e) => println!("error: {e}"),
        }
    }
    Ok(())
}
