//! # host-cli
//!
//! deck-runtime 的无头终端宿主。
//!
//! 内置一套演示幻灯片，用标准输入驱动导航，把引擎发出的指令
//! 以结构化日志的形式"渲染"出来。真实的图形宿主只需要把
//! [`StageState::execute`] 换成对渲染后端的调用。
//!
//! ## 输入映射
//!
//! - 回车 / `n`：前进（带过渡）
//! - `f`：前进（跳过过渡）
//! - `p`：后退
//! - `g <序号>`：跳到指定幻灯片
//! - `r <宽> <高>`：上报新的舞台容器尺寸
//! - `o`：弹出备注窗口
//! - `q`：退出

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{self, BufRead};
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use tracing::{error, info, warn};

use deck_runtime::{
    CodeBlock, Command, ContentId, CrossFade, GoToOptions, NavStatus, NavigationInput, PendingCode,
    Presentation, Rect, SurfaceId,
};

/// 命令行参数
#[derive(Parser, Debug)]
#[command(name = "host-cli", about = "deck-runtime 无头演示宿主")]
struct Args {
    /// 舞台容器宽度（像素）
    #[arg(long, default_value_t = 1280.0)]
    stage_width: f64,

    /// 舞台容器高度（像素）
    #[arg(long, default_value_t = 720.0)]
    stage_height: f64,

    /// 外部代码示例加载的文件
    #[arg(long, default_value = "host-cli/src/main.rs")]
    code: String,
}

/// 用户输入解析结果
enum HostAction {
    Nav(NavigationInput),
    GoTo(usize),
    Resize(f64, f64),
    PopOut,
    Quit,
    Noop,
}

/// 舞台状态
///
/// 跟踪已挂载的表面与透明度，顺带验证指令流自洽
/// （移除未挂载的表面说明宿主或引擎出了问题）。
#[derive(Default)]
struct StageState {
    surfaces: HashMap<SurfaceId, f32>,
}

impl StageState {
    fn execute(&mut self, cmd: &Command) {
        match cmd {
            Command::AttachSurface { surface, opacity } => {
                self.surfaces.insert(*surface, *opacity);
                info!("挂载表面 {:?}（opacity {:.2}）", surface, opacity);
            }
            Command::DetachSurface { surface } => {
                if self.surfaces.remove(surface).is_none() {
                    warn!("移除了未挂载的表面 {:?}", surface);
                } else {
                    info!("移除表面 {:?}", surface);
                }
            }
            Command::SetOpacity { surface, opacity } => {
                if let Some(slot) = self.surfaces.get_mut(surface) {
                    *slot = *opacity;
                }
            }
            Command::SetStageTransform { transform } => {
                info!(
                    "舞台变换 translate({:.1}, {:.1}) scale({:.3})",
                    transform.translate_x, transform.translate_y, transform.scale
                );
            }
            Command::SetNotesTransform { transform } => {
                info!(
                    "备注变换 translate({:.1}, {:.1}) scale({:.3})",
                    transform.translate_x, transform.translate_y, transform.scale
                );
            }
            Command::OpenNotesWindow => {
                info!("打开独立备注窗口");
            }
            Command::MountText { surface, text } => {
                info!("[{:?}] 文本: {}", surface, text);
            }
            Command::MountCode { surface, lines, .. } => {
                info!("[{:?}] 代码块（{} 行已高亮）", surface, lines.len());
            }
            Command::RequestContent { content, source } => {
                info!("请求外部内容 {:?}: {}", content, source);
            }
        }
    }

    /// 当前可见表面的数量（opacity > 0）
    fn visible_count(&self) -> usize {
        self.surfaces.values().filter(|o| **o > 0.0).count()
    }
}

/// 构建演示幻灯片
fn build_deck(args: &Args, pending_code: Rc<RefCell<Vec<PendingCode>>>) -> Presentation {
    let mut preso = Presentation::new();

    // 第 0 张：标题 + 两个逐条展示的要点
    preso.slide(|s| {
        s.mount_text("deck-runtime 演示");
        s.reveal(|cx| {
            cx.mount_text("导航与过渡由引擎编排");
            Ok(())
        });
        s.reveal(|cx| {
            cx.mount_text("渲染由宿主决定");
            Ok(())
        });
        Ok(())
    });

    // 第 1 张：内联代码（立即高亮，票据当场结清）
    preso.slide(|s| {
        s.mount_text("内联代码");
        CodeBlock::inline(
            r#"
            fn greet(name: &str) {
                println!("你好，{name}");
            }
            "#,
        )
        .lang("rs")
        .mount(s.ctx())?;
        Ok(())
    });
    // 进入下一张用慢速淡入淡出
    let _ = preso.transition(|spec| Box::new(CrossFade::with_duration(spec, 0.8)));

    // 第 2 张：外部代码。宿主取回文本之前，进入过渡被同步屏障推迟
    {
        let pending_code = pending_code.clone();
        let path = args.code.clone();
        preso.slide(move |s| {
            s.mount_text("外部代码（就绪同步）");
            if let Some(pending) = CodeBlock::external(path.clone())
                .lang("rs")
                .lines(1, 20)
                .mount(s.ctx())?
            {
                pending_code.borrow_mut().push(pending);
            }
            Ok(())
        });
    }

    preso
}

/// 解析一行用户输入
fn parse_action(line: &str) -> HostAction {
    let mut parts = line.split_whitespace();
    match parts.next() {
        None | Some("n") => HostAction::Nav(NavigationInput::forward()),
        Some("f") => HostAction::Nav(NavigationInput::forward_skipping()),
        Some("p") => HostAction::Nav(NavigationInput::backward()),
        Some("g") => match parts.next().and_then(|s| s.parse().ok()) {
            Some(index) => HostAction::GoTo(index),
            None => {
                warn!("用法: g <序号>");
                HostAction::Noop
            }
        },
        Some("r") => {
            let w = parts.next().and_then(|s| s.parse().ok());
            let h = parts.next().and_then(|s| s.parse().ok());
            match (w, h) {
                (Some(w), Some(h)) => HostAction::Resize(w, h),
                _ => {
                    warn!("用法: r <宽> <高>");
                    HostAction::Noop
                }
            }
        }
        Some("o") => HostAction::PopOut,
        Some("q") => HostAction::Quit,
        Some(other) => {
            warn!("未知输入: {other}（回车前进，q 退出）");
            HostAction::Noop
        }
    }
}

/// 推进引擎直到空闲
///
/// 执行产生的指令；遇到 `RequestContent` 时从文件系统取回文本并
/// 回填对应的代码块。
fn drive(
    preso: &mut Presentation,
    stage: &mut StageState,
    pending_code: &Rc<RefCell<Vec<PendingCode>>>,
    mut input: Option<NavigationInput>,
) {
    let mut last = Instant::now();
    loop {
        let dt = last.elapsed().as_secs_f32();
        last = Instant::now();

        let (commands, status) = match preso.tick(dt, input.take()) {
            Ok(out) => out,
            Err(e) => {
                error!("导航失败: {e}");
                continue;
            }
        };

        for cmd in &commands {
            stage.execute(cmd);
            if let Command::RequestContent { content, source } = cmd {
                resolve_content(stage, pending_code, *content, source);
            }
        }

        match status {
            NavStatus::Idle => break,
            NavStatus::AwaitingContent { outstanding } => {
                info!("等待 {outstanding} 项内容就绪…");
            }
            NavStatus::Transitioning => {}
        }

        // 模拟帧节奏
        std::thread::sleep(Duration::from_millis(16));
    }
}

/// 取回外部内容并回填代码块
fn resolve_content(
    stage: &mut StageState,
    pending_code: &Rc<RefCell<Vec<PendingCode>>>,
    content: ContentId,
    source: &str,
) {
    let pending = {
        let mut list = pending_code.borrow_mut();
        list.iter()
            .position(|p| p.content_id() == content)
            .map(|i| list.remove(i))
    };
    let Some(pending) = pending else {
        warn!("没有等待回填的代码块（来源 {source}）");
        return;
    };

    match fs::read_to_string(source) {
        Ok(text) => match pending.fulfill(&text) {
            Ok(cmd) => stage.execute(&cmd),
            Err(e) => error!("高亮失败: {e}"),
        },
        Err(e) => {
            error!("读取 {source} 失败: {e}");
            pending.reject(format!("读取失败: {e}"));
        }
    }
}

fn print_status(preso: &Presentation, stage: &StageState) {
    if let (Some(index), Some(current)) = (preso.current_index(), preso.current()) {
        info!(
            "== 第 {}/{} 张，状态 {}/{}，可见表面 {} ==",
            index + 1,
            preso.slide_count(),
            current.state_cursor() + 1,
            current.state_count(),
            stage.visible_count()
        );
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();
    let args = Args::parse();

    let pending_code = Rc::new(RefCell::new(Vec::new()));
    let mut preso = build_deck(&args, pending_code.clone());
    let mut stage = StageState::default();

    // 上报初始容器尺寸（真实宿主在窗口 resize 回调里做同样的事）
    preso.set_stage_bounds(Rect::sized(args.stage_width, args.stage_height));

    // 完成首张幻灯片的自动导航
    drive(&mut preso, &mut stage, &pending_code, None);
    print_status(&preso, &stage);

    info!("回车前进 | f 快进 | p 后退 | g <序号> | r <宽> <高> | o 弹出备注 | q 退出");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        match parse_action(line.trim()) {
            HostAction::Quit => break,
            HostAction::Noop => continue,
            HostAction::Nav(input) => {
                drive(&mut preso, &mut stage, &pending_code, Some(input));
            }
            HostAction::GoTo(index) => {
                if let Err(e) = preso.go_to(index, GoToOptions::default()) {
                    error!("{e}");
                    continue;
                }
                drive(&mut preso, &mut stage, &pending_code, None);
            }
            HostAction::Resize(w, h) => {
                preso.set_stage_bounds(Rect::sized(w, h));
                drive(&mut preso, &mut stage, &pending_code, None);
            }
            HostAction::PopOut => {
                match preso.pop_out_notes() {
                    Ok(()) => {
                        // 新窗口的包围盒由宿主上报；这里用固定尺寸模拟
                        preso.set_notes_bounds(Rect::sized(960.0, 540.0));
                    }
                    Err(e) => error!("{e}"),
                }
                drive(&mut preso, &mut stage, &pending_code, None);
            }
        }
        print_status(&preso, &stage);
    }

    Ok(())
}
