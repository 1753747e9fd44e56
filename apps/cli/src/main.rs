//! # Hand CLI
//!
//! 在仿真环境中运行完整的触觉手控制栈。
//!
//! ```bash
//! # 打印默认配置
//! hand-cli config > hand.toml
//!
//! # 启动仿真与交互式 Shell
//! RUST_LOG=hand_cli=debug,task_control=debug hand-cli sim --config hand.toml
//! ```
//!
//! 线程布局：
//!
//! ```text
//! main   : rustyline Shell ──TaskCommand──▶ TaskInbox
//! task   : TaskStateMachine::tick()        ──HandRequest──▶ (rpc channel)
//! rpc    : HandRpcServer::serve()          ──暂存命令──▶ HandControlModule
//! hand   : HandControlModule::tick()
//! world  : MockJointDevice::advance()      ──SkinContact──▶ (tactile channel)
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hand_control::{
    ChannelTactileSource, ControlError, HandControlModule, LoopConfig, rpc_channel, run_periodic,
};
use hand_driver::MockJointDevice;
use hand_kinematics::ICubFingerChains;
use hand_protocol::HandSide;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use task_control::{Limb, Pose, SystemClock, TaskStateMachine};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod repl;
mod sim;

use config::AppConfig;
use sim::{FixedObject, LogFilter, SimArm, SimWorld};

/// Hand CLI - 触觉手控制仿真
#[derive(Parser, Debug)]
#[command(name = "hand-cli")]
#[command(about = "Simulation runner for the tactile hand control stack", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 启动仿真与交互式 Shell
    Sim {
        /// 配置文件（TOML）
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// 覆盖配置中的手（left / right）
        #[arg(long)]
        hand: Option<HandSide>,
    },

    /// 打印配置（默认配置或指定文件合并默认值后的结果）
    Config {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hand_cli=info,hand_control=info,task_control=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Sim { config, hand } => {
            let mut app = AppConfig::load(config.as_deref())?;
            if let Some(hand) = hand {
                app.hand.hand = hand;
            }
            run_sim(app)
        },
        Commands::Config { config } => {
            let app = AppConfig::load(config.as_deref())?;
            print!("{}", app.to_toml()?);
            Ok(())
        },
    }
}

fn spawn_loop<F>(name: &str, period: Duration, running: Arc<AtomicBool>, mut tick: F) -> Result<thread::JoinHandle<Result<u64, ControlError>>>
where
    F: FnMut() + Send + 'static,
{
    let thread_name = name.to_string();
    thread::Builder::new()
        .name(thread_name.clone())
        .spawn(move || {
            let result = run_periodic(&LoopConfig::with_period(period), &running, &mut tick);
            debug!(thread = %thread_name, ?result, "Loop finished");
            result
        })
        .with_context(|| format!("Failed to spawn {name} thread"))
}

fn run_sim(app: AppConfig) -> Result<()> {
    let side = app.hand.hand;
    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::Release))
            .context("Failed to install Ctrl+C handler")?;
    }

    // ==================== 手部 ====================
    let device = MockJointDevice::with_positions(&app.sim.initial_joints);
    let (contact_tx, contact_rx) = sim::contact_channel();
    let module = Arc::new(HandControlModule::from_config(
        &app.hand,
        Arc::new(device.clone()),
        &ICubFingerChains,
        Box::new(ChannelTactileSource::new(contact_rx)),
    )?);
    let (client, server) = rpc_channel(Duration::from_millis(app.sim.rpc_timeout_ms));

    let world = SimWorld::new(
        device,
        side,
        &app.hand.fingers,
        app.sim.contact_travel_deg,
        contact_tx,
    )?;
    let world_period = app.hand.period();
    let world_thread = spawn_loop("world", world_period, Arc::clone(&running), move || {
        world.step(world_period)
    })?;

    let rpc_thread = {
        let module = Arc::clone(&module);
        let running = Arc::clone(&running);
        let poll = app.hand.period();
        thread::Builder::new()
            .name("rpc".to_string())
            .spawn(move || server.serve(&module, &running, poll))
            .context("Failed to spawn rpc thread")?
    };

    let hand_thread = {
        let module = Arc::clone(&module);
        spawn_loop("hand", app.hand.period(), Arc::clone(&running), move || module.tick())?
    };

    // ==================== 任务 ====================
    let arm = SimArm::new(Pose::from_rpy(app.sim.arm_start_position, app.task.home_rpy));
    let mut limbs = BTreeMap::new();
    limbs.insert(side, Limb::new(Box::new(arm), Arc::new(client)));
    let mut machine = TaskStateMachine::new(
        app.task.clone(),
        Arc::new(SystemClock::new()),
        Box::<LogFilter>::default(),
        Box::new(FixedObject::new(app.sim.object_position)),
        limbs,
    );
    let inbox = machine.inbox();
    let task_thread = {
        let running = Arc::clone(&running);
        thread::Builder::new()
            .name("task".to_string())
            .spawn(move || machine.run(&running))
            .context("Failed to spawn task thread")?
    };

    info!(hand = %side, fingers = ?app.hand.fingers, "Simulation running");

    let defaults = repl::Defaults {
        hand: side,
        fingers: app.hand.fingers.clone(),
        forward_speed: app.sim.forward_speed,
        restore_speed: app.sim.restore_speed,
    };
    let shell_result = repl::run(&inbox, &defaults, &running);

    // ==================== 关闭 ====================
    running.store(false, Ordering::Release);
    for (name, handle) in [("task", task_thread), ("hand", hand_thread), ("world", world_thread)] {
        match handle.join() {
            Ok(Ok(iterations)) => debug!(thread = name, iterations, "Thread joined"),
            Ok(Err(e)) => warn!(thread = name, error = %e, "Loop exited with error"),
            Err(_) => warn!(thread = name, "Thread panicked"),
        }
    }
    match rpc_thread.join() {
        Ok(served) => debug!(thread = "rpc", served, "Thread joined"),
        Err(_) => warn!(thread = "rpc", "Thread panicked"),
    }
    if let Err(e) = module.close() {
        warn!(error = %e, "Failed to stop fingers on shutdown");
    }
    info!("Simulation stopped");
    shell_result
}
