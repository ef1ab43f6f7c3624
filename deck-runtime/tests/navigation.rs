//! # 导航集成测试
//!
//! 测试 Presentation → SlideRuntime → Command 的完整导航链路。
//! 这些测试不依赖真实的渲染后端，只断言指令流与游标状态。

use deck_runtime::{
    Command, GoToOptions, InitialState, NavStatus, NavigationInput, Presentation, SlideError,
    SlideSpec,
};

/// 跑空 tick 直到导航结束，返回收集到的指令
fn settle(preso: &mut Presentation) -> Vec<Command> {
    let mut all = Vec::new();
    for _ in 0..64 {
        let (commands, status) = preso.tick(0.1, None).unwrap();
        all.extend(commands);
        if status == NavStatus::Idle {
            break;
        }
    }
    all
}

/// 单状态幻灯片（立即 complete）
fn simple_slide(s: &mut SlideSpec<'_>) -> Result<(), SlideError> {
    s.mount_text("内容");
    Ok(())
}

/// 三个展示状态的幻灯片
fn three_state_slide(s: &mut SlideSpec<'_>) -> Result<(), SlideError> {
    s.mount_text("状态 0");
    s.reveal(|cx| {
        cx.mount_text("状态 1");
        Ok(())
    });
    s.reveal(|cx| {
        cx.mount_text("状态 2");
        Ok(())
    });
    Ok(())
}

/// 测试对所有合法索引 go_to 都落到正确位置
#[test]
fn test_go_to_every_valid_index() {
    let mut preso = Presentation::new();
    for _ in 0..4 {
        preso.slide(simple_slide);
    }
    settle(&mut preso);

    for k in [2, 0, 3, 1] {
        preso
            .go_to(
                k,
                GoToOptions {
                    skip_transition: true,
                    ..Default::default()
                },
            )
            .unwrap();
        settle(&mut preso);
        assert_eq!(preso.current_index(), Some(k));
        // 恰好一个存活的运行时
        assert!(preso.current().is_some());
        assert!(!preso.is_navigating());
    }
}

/// 测试三张幻灯片的完整前进流程
///
/// 1. 追加 3 张 → 自动进入第 0 张
/// 2. 两次 next →（每张都立即 complete）索引 1、2
/// 3. 第三次 next → 仍停在 2
#[test]
fn test_three_slide_forward_scenario() {
    let mut preso = Presentation::new();
    preso.slide(simple_slide);
    preso.slide(simple_slide);
    preso.slide(simple_slide);

    settle(&mut preso);
    assert_eq!(preso.current_index(), Some(0));

    preso.next(false);
    settle(&mut preso);
    assert_eq!(preso.current_index(), Some(1));

    preso.next(false);
    settle(&mut preso);
    assert_eq!(preso.current_index(), Some(2));

    // 最后一张已 complete：next 是 no-op
    preso.next(false);
    settle(&mut preso);
    assert_eq!(preso.current_index(), Some(2));
    assert_eq!(preso.current().unwrap().state_cursor(), 0);
}

/// 测试 next 在未完成的幻灯片上只推进展示游标
#[test]
fn test_next_advances_reveal_cursor_without_changing_slide() {
    let mut preso = Presentation::new();
    preso.slide(three_state_slide);
    preso.slide(simple_slide);
    settle(&mut preso);

    assert_eq!(preso.current().unwrap().state_cursor(), 0);
    assert!(!preso.current().unwrap().complete());

    preso.next(false);
    assert_eq!(preso.current_index(), Some(0));
    assert_eq!(preso.current().unwrap().state_cursor(), 1);

    preso.next(false);
    assert_eq!(preso.current_index(), Some(0));
    assert_eq!(preso.current().unwrap().state_cursor(), 2);
    assert!(preso.current().unwrap().complete());

    // 展示状态耗尽后才切换幻灯片
    preso.next(false);
    settle(&mut preso);
    assert_eq!(preso.current_index(), Some(1));
}

/// 测试 previous 在片内回退：重启脚本并快进到上一个状态
#[test]
fn test_previous_within_slide_restarts_and_fast_forwards() {
    let mut preso = Presentation::new();
    preso.slide(three_state_slide);
    settle(&mut preso);

    preso.next(false);
    preso.next(false);
    assert_eq!(preso.current().unwrap().state_cursor(), 2);
    let old_surface = preso.current().unwrap().surface();

    preso.previous();
    settle(&mut preso);

    // 仍在同一张，但运行时是全新构造的
    assert_eq!(preso.current_index(), Some(0));
    assert_eq!(preso.current().unwrap().state_cursor(), 1);
    assert_ne!(preso.current().unwrap().surface(), old_surface);
}

/// 测试 previous 跨片回退：落在上一张的最后一个状态
#[test]
fn test_previous_across_slides_lands_on_last_state() {
    let mut preso = Presentation::new();
    preso.slide(three_state_slide);
    preso.slide(simple_slide);
    settle(&mut preso);

    // 走完第 0 张再进入第 1 张
    preso.next(false);
    preso.next(false);
    preso.next(false);
    settle(&mut preso);
    assert_eq!(preso.current_index(), Some(1));

    // 回退：上一张的状态总数只有重跑脚本才知道
    preso.previous();
    settle(&mut preso);
    assert_eq!(preso.current_index(), Some(0));
    assert_eq!(preso.current().unwrap().state_cursor(), 2);
    assert!(preso.current().unwrap().complete());
}

/// 测试 previous 在第 0 张状态 0 是 no-op
#[test]
fn test_previous_at_origin_is_noop() {
    let mut preso = Presentation::new();
    preso.slide(three_state_slide);
    settle(&mut preso);
    let surface = preso.current().unwrap().surface();

    preso.previous();
    settle(&mut preso);

    assert_eq!(preso.current_index(), Some(0));
    assert_eq!(preso.current().unwrap().state_cursor(), 0);
    // 没有发生重启
    assert_eq!(preso.current().unwrap().surface(), surface);
}

/// 测试通过 tick 输入驱动的按键映射流程
#[test]
fn test_input_driven_navigation() {
    let mut preso = Presentation::new();
    preso.slide(three_state_slide);
    preso.slide(simple_slide);
    settle(&mut preso);

    // 前进键：推进展示状态
    preso.tick(0.1, Some(NavigationInput::forward())).unwrap();
    assert_eq!(preso.current().unwrap().state_cursor(), 1);

    // 快进键：继续推进（跳过内部动画）
    preso
        .tick(0.1, Some(NavigationInput::forward_skipping()))
        .unwrap();
    assert!(preso.current().unwrap().complete());

    // 完成后前进切换幻灯片
    preso.tick(0.1, Some(NavigationInput::forward())).unwrap();
    settle(&mut preso);
    assert_eq!(preso.current_index(), Some(1));

    // 后退键：回到上一张的最后状态
    preso.tick(0.1, Some(NavigationInput::backward())).unwrap();
    settle(&mut preso);
    assert_eq!(preso.current_index(), Some(0));
    assert_eq!(preso.current().unwrap().state_cursor(), 2);
}

/// 测试指令顺序：挂载 → 就绪/过渡 → 移除旧表面
#[test]
fn test_command_ordering_within_navigation() {
    let mut preso = Presentation::new();
    preso.slide(simple_slide);
    preso.slide(simple_slide);
    settle(&mut preso);
    let old_surface = preso.current().unwrap().surface();

    preso.go_to(1, GoToOptions::default()).unwrap();
    let commands = settle(&mut preso);
    let new_surface = preso.current().unwrap().surface();

    let attach = commands
        .iter()
        .position(|c| matches!(c, Command::AttachSurface { surface, .. } if *surface == new_surface))
        .expect("应当先挂载新表面");
    let last_opacity = commands
        .iter()
        .rposition(|c| matches!(c, Command::SetOpacity { surface, opacity } if *surface == new_surface && *opacity == 1.0))
        .expect("过渡应当把新表面推到不透明");
    let detach = commands
        .iter()
        .position(|c| matches!(c, Command::DetachSurface { surface } if *surface == old_surface))
        .expect("最后移除旧表面");

    assert!(attach < last_opacity);
    assert!(last_opacity < detach);
    // 移除旧表面是导航的最后一条表面指令
    assert_eq!(
        commands
            .iter()
            .rposition(|c| matches!(c, Command::DetachSurface { .. }))
            .unwrap(),
        detach
    );
}

/// 测试重新进入同一张幻灯片会重启脚本
#[test]
fn test_reentering_slide_restarts_script() {
    use std::cell::Cell;
    use std::rc::Rc;

    let runs = Rc::new(Cell::new(0));
    let mut preso = Presentation::new();
    {
        let runs = runs.clone();
        preso.slide(move |s| {
            runs.set(runs.get() + 1);
            s.mount_text("计数");
            Ok(())
        });
    }
    preso.slide(simple_slide);
    settle(&mut preso);
    assert_eq!(runs.get(), 1);

    preso
        .go_to(
            0,
            GoToOptions {
                skip_transition: true,
                ..Default::default()
            },
        )
        .unwrap();
    settle(&mut preso);
    assert_eq!(runs.get(), 2);

    preso
        .go_to(
            1,
            GoToOptions {
                skip_transition: true,
                ..Default::default()
            },
        )
        .unwrap();
    settle(&mut preso);
    preso.tick(0.1, Some(NavigationInput::backward())).unwrap();
    settle(&mut preso);
    assert_eq!(runs.get(), 3);
}

/// 测试 Last 哨兵进入指定状态
#[test]
fn test_go_to_with_initial_state() {
    let mut preso = Presentation::new();
    preso.slide(simple_slide);
    preso.slide(three_state_slide);
    settle(&mut preso);

    preso
        .go_to(
            1,
            GoToOptions {
                initial_state: InitialState::Last,
                skip_transition: true,
            },
        )
        .unwrap();
    settle(&mut preso);
    assert_eq!(preso.current().unwrap().state_cursor(), 2);
    assert!(preso.current().unwrap().complete());

    preso
        .go_to(
            1,
            GoToOptions {
                initial_state: InitialState::State(1),
                skip_transition: true,
            },
        )
        .unwrap();
    settle(&mut preso);
    assert_eq!(preso.current().unwrap().state_cursor(), 1);
    assert!(!preso.current().unwrap().complete());
}
