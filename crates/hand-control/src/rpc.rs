//! 手部控制 RPC
//!
//! - [`LocalHandClient`]: 同线程直接调用 [`HandControlModule::handle`]
//! - [`rpc_channel`]: 基于 crossbeam channel 的客户端/服务端对。
//!   服务端可在独立线程中阻塞服务（[`HandRpcServer::serve`]），
//!   也可在控制线程中每个周期处理待办请求（[`HandRpcServer::serve_pending`]）。
//!   `handle` 只暂存命令，两种方式都不会与控制周期争抢设备。

use crate::HandControlModule;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use hand_protocol::{HandRequest, HandResponse};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// RPC 客户端错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// 服务端已关闭
    #[error("Hand control server disconnected")]
    Disconnected,

    /// 等待响应超时
    #[error("Hand control request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

/// 手部控制客户端
pub trait HandClient: Send + Sync {
    fn send(&self, request: &HandRequest) -> Result<HandResponse, ClientError>;
}

/// 进程内直接调用的客户端
#[derive(Clone)]
pub struct LocalHandClient {
    module: Arc<HandControlModule>,
}

impl LocalHandClient {
    pub fn new(module: Arc<HandControlModule>) -> Self {
        Self { module }
    }
}

impl HandClient for LocalHandClient {
    fn send(&self, request: &HandRequest) -> Result<HandResponse, ClientError> {
        Ok(self.module.handle(request))
    }
}

/// 请求 + 回复通道
struct Envelope {
    request: HandRequest,
    reply: Sender<HandResponse>,
}

/// 基于 channel 的客户端
#[derive(Clone)]
pub struct ChannelHandClient {
    tx: Sender<Envelope>,
    timeout: Duration,
}

/// 基于 channel 的服务端
pub struct HandRpcServer {
    rx: Receiver<Envelope>,
}

/// 创建客户端/服务端对
pub fn rpc_channel(timeout: Duration) -> (ChannelHandClient, HandRpcServer) {
    let (tx, rx) = crossbeam_channel::unbounded();
    (ChannelHandClient { tx, timeout }, HandRpcServer { rx })
}

impl HandClient for ChannelHandClient {
    fn send(&self, request: &HandRequest) -> Result<HandResponse, ClientError> {
        let (reply, response) = crossbeam_channel::bounded(1);
        self.tx
            .send(Envelope {
                request: request.clone(),
                reply,
            })
            .map_err(|_| ClientError::Disconnected)?;

        response.recv_timeout(self.timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => ClientError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            },
            RecvTimeoutError::Disconnected => ClientError::Disconnected,
        })
    }
}

impl HandRpcServer {
    /// 阻塞服务请求，直到 `is_running` 变为 `false` 或所有客户端断开
    ///
    /// `poll` 是两次检查 `is_running` 之间的最长等待。返回处理的请求数。
    pub fn serve(&self, module: &HandControlModule, is_running: &AtomicBool, poll: Duration) -> u64 {
        let mut served = 0;
        while is_running.load(Ordering::Acquire) {
            match self.rx.recv_timeout(poll) {
                Ok(envelope) => {
                    let response = module.handle(&envelope.request);
                    let _ = envelope.reply.send(response);
                    served += 1;
                },
                Err(RecvTimeoutError::Timeout) => {},
                Err(RecvTimeoutError::Disconnected) => {
                    debug!(served, "All hand clients disconnected");
                    break;
                },
            }
        }
        served
    }

    /// 非阻塞处理所有待办请求，返回处理数量
    ///
    /// 所有客户端都已断开时返回 `Err(ClientError::Disconnected)`。
    pub fn serve_pending(&self, module: &HandControlModule) -> Result<usize, ClientError> {
        let mut served = 0;
        loop {
            match self.rx.try_recv() {
                Ok(envelope) => {
                    let response = module.handle(&envelope.request);
                    // 客户端可能已超时放弃
                    let _ = envelope.reply.send(response);
                    served += 1;
                },
                Err(TryRecvError::Empty) => return Ok(served),
                Err(TryRecvError::Disconnected) => {
                    return if served > 0 {
                        Ok(served)
                    } else {
                        Err(ClientError::Disconnected)
                    };
                },
            }
        }
    }
}
