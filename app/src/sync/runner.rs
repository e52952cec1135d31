//! 子进程执行：逐行输出 + 退出码

use std::fmt;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use utils::error::{Error, Result};

use super::command::SyncCommand;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// 子进程输出的一行（不含换行符）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub stream: OutputStream,
    pub text: String,
}

/// 子进程退出状态。只有退出码 0 视为成功；被信号终止时没有退出码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus {
    code: Option<i32>,
}

impl ExitStatus {
    pub fn from_code(code: i32) -> Self {
        Self { code: Some(code) }
    }

    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {}", code),
            None => write!(f, "terminated by signal"),
        }
    }
}

type LineResult = std::io::Result<OutputLine>;

/// 正在运行的同步子进程
///
/// stdout 和 stderr 各由一个后台任务读取并合并到同一个通道，
/// 调用方即使不读取输出，子进程也不会因管道写满而阻塞。
pub struct SyncProcess {
    program: String,
    child: Child,
    lines: mpsc::UnboundedReceiver<LineResult>,
    readers: Vec<JoinHandle<()>>,
}

impl SyncProcess {
    /// 启动子进程，不等待其结束
    pub fn start(command: &SyncCommand) -> Result<Self> {
        log::debug!("Spawning `{}`", command);

        let mut child = Command::new(command.program())
            .args(command.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: command.program().to_string(),
                source,
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        Ok(Self::attach(command.program(), child, stdout, stderr))
    }

    /// 为已启动的子进程接上输出读取任务
    pub(super) fn attach<O, E>(program: &str, child: Child, stdout: Option<O>, stderr: Option<E>) -> Self
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut readers = Vec::with_capacity(2);

        if let Some(stdout) = stdout {
            readers.push(tokio::spawn(forward_lines(
                stdout,
                OutputStream::Stdout,
                tx.clone(),
            )));
        }
        if let Some(stderr) = stderr {
            readers.push(tokio::spawn(forward_lines(stderr, OutputStream::Stderr, tx)));
        }

        Self {
            program: program.to_string(),
            child,
            lines: rx,
            readers,
        }
    }

    /// 下一行输出；两个输出流都关闭后返回 `None`
    pub async fn next_line(&mut self) -> Option<Result<OutputLine>> {
        self.lines
            .recv()
            .await
            .map(|line| line.map_err(Error::from))
    }

    /// 等待子进程退出并回收，同时等待输出读取任务结束
    pub async fn wait(mut self) -> Result<ExitStatus> {
        let status = self.child.wait().await?;

        for reader in self.readers.drain(..) {
            if let Err(e) = reader.await {
                log::warn!("Output reader of `{}` failed: {}", self.program, e);
            }
        }

        let status = ExitStatus::from(status);
        log::debug!("`{}` finished with {}", self.program, status);
        Ok(status)
    }
}

async fn forward_lines<R>(stream: R, kind: OutputStream, tx: mpsc::UnboundedSender<LineResult>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = OutputLine {
                    stream: kind,
                    text: decode_line(&buf),
                };
                // 接收端已关闭时继续读取，保证管道被排空
                let _ = tx.send(Ok(line));
            }
            Err(e) => {
                let _ = tx.send(Err(e));
                break;
            }
        }
    }
}

/// 去掉 `\n` / `\r\n`，非 UTF-8 字节按替换字符处理
fn decode_line(buf: &[u8]) -> String {
    let mut end = buf.len();
    if end > 0 && buf[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && buf[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&buf[..end]).into_owned()
}
