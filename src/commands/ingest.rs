//! 面单照片导入（交互式）

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::render::{print_commit_report, print_image_results, print_matches, print_unmatched};
use crate::error::{AppError, AppResult};
use crate::services::tracking_import::{BatchOrchestrator, BatchPhase, BatchState, CancelHandle, ReviewSession};
use crate::utils::{collect_image_paths, load_uploads};
use crate::AppState;

pub async fn ingest(state: &AppState, inputs: &[PathBuf], assume_yes: bool) -> AppResult<()> {
    let paths = collect_image_paths(inputs)?;
    let uploads = load_uploads(&paths)?;
    println!("[1/3] 识别 {} 张图片...", uploads.len());

    let orchestrator = BatchOrchestrator::new(state.db.clone(), state.extractor.clone());
    let progress_task = tokio::spawn(render_progress(orchestrator.subscribe()));
    let batch_running = Arc::new(AtomicBool::new(true));
    let _interrupts = InterruptGuard(tokio::spawn(watch_interrupts(
        orchestrator.cancel_handle(),
        batch_running.clone(),
    )));

    let outcome = orchestrator.run_batch(uploads).await;
    batch_running.store(false, Ordering::SeqCst);
    let snapshot = orchestrator.state();
    // 关闭进度通道，进度条任务随之结束
    drop(orchestrator);
    let _ = progress_task.await;

    let report = match outcome {
        Ok(report) => report,
        Err(err) => {
            if !snapshot.completed.is_empty() {
                print_image_results(&snapshot.completed);
            }
            return Err(err);
        }
    };

    println!("[2/3] 识别结果");
    print_image_results(&report.per_image);

    let mut session = ReviewSession::new(report, state.config.search.clone());
    println!("{}", session.status().message());
    if !session.can_proceed() {
        return Ok(());
    }
    if !assume_yes && !session.opens_on_unmatched() && !confirm("继续审核匹配结果？")? {
        session.cancel()?;
        println!("已取消，未写入任何数据");
        return Ok(());
    }
    session.proceed()?;

    println!("[3/3] 审核匹配");
    if !assume_yes {
        review_matches(state, &mut session).await?;
    }
    if session.matched().is_empty() {
        session.cancel()?;
        println!("没有可提交的匹配");
        return Ok(());
    }
    print_matches(session.matched());

    let prompt = format!("提交 {} 个订单的运单号？", session.matched().len());
    if !assume_yes && !confirm(&prompt)? {
        session.cancel()?;
        println!("已取消，未写入任何数据");
        return Ok(());
    }
    let report = session.commit(&state.db).await?;
    print_commit_report(&report);
    Ok(())
}

/// Ctrl-C 的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interrupt {
    CancelBatch,
    Exit,
}

/// 识别进行中第一次 Ctrl-C 只取消批处理；之后的 Ctrl-C 直接退出进程
fn on_interrupt(batch_running: bool, already_cancelled: bool) -> Interrupt {
    if batch_running && !already_cancelled {
        Interrupt::CancelBatch
    } else {
        Interrupt::Exit
    }
}

/// 监听整个导入过程中的 Ctrl-C
///
/// tokio 注册 SIGINT 后不会恢复默认处理，任务结束后 Ctrl-C 将不再终止进程，
/// 所以审核和提交阶段也要由这里负责退出。
async fn watch_interrupts(cancel: CancelHandle, batch_running: Arc<AtomicBool>) {
    while tokio::signal::ctrl_c().await.is_ok() {
        match on_interrupt(batch_running.load(Ordering::SeqCst), cancel.is_cancelled()) {
            Interrupt::CancelBatch => {
                tracing::info!("Cancellation requested, press Ctrl-C again to quit");
                cancel.cancel();
            }
            Interrupt::Exit => {
                tracing::warn!("Interrupted");
                std::process::exit(130);
            }
        }
    }
}

struct InterruptGuard(JoinHandle<()>);

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn render_progress(mut receiver: watch::Receiver<BatchState>) {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{prefix:>7} [{bar:30.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    while receiver.changed().await.is_ok() {
        let state = receiver.borrow_and_update().clone();
        bar.set_prefix(format!("{}/{}", state.current_index, state.total_images));
        bar.set_position(u64::from(state.percent));
        match state.phase {
            BatchPhase::Matching => bar.set_message("matching orders"),
            _ => bar.set_message(format!(
                "{} {}",
                state.current_file.as_deref().unwrap_or(""),
                state.stage.label()
            )),
        }
        if state.phase != BatchPhase::Idle && !state.is_running() {
            break;
        }
    }
    bar.finish_and_clear();
}

async fn review_matches(state: &AppState, session: &mut ReviewSession) -> AppResult<()> {
    loop {
        if !session.matched().is_empty() {
            println!("已匹配:");
            print_matches(session.matched());
        }
        if !session.unmatched().is_empty() {
            println!("未匹配:");
            print_unmatched(session.unmatched());
        }

        let mut actions = vec!["完成审核".to_string()];
        actions.extend(
            session
                .unmatched()
                .iter()
                .map(|e| format!("手动匹配 {}（电话 {}）", e.tracking, e.phone)),
        );
        actions.extend(
            session
                .matched()
                .iter()
                .map(|m| format!("撤销 {} → {}", m.tracking, m.order_code)),
        );

        let choice = Select::new()
            .with_prompt("选择操作")
            .items(&actions)
            .default(0)
            .interact()
            .map_err(interaction_err)?;

        let unmatched_len = session.unmatched().len();
        if choice == 0 {
            return Ok(());
        } else if choice <= unmatched_len {
            let entry_id = session.unmatched()[choice - 1].entry_id;
            reconcile_entry(state, session, entry_id).await?;
        } else {
            session.unbind(choice - 1 - unmatched_len)?;
        }
    }
}

async fn reconcile_entry(state: &AppState, session: &mut ReviewSession, entry_id: usize) -> AppResult<()> {
    loop {
        let query: String = Input::new()
            .with_prompt("搜索订单号或联系信息（留空返回）")
            .allow_empty(true)
            .interact_text()
            .map_err(interaction_err)?;
        if query.trim().is_empty() {
            return Ok(());
        }

        let results = session.search(&state.db, entry_id, &query).await?;
        if results.is_empty() {
            println!(
                "没有找到待发货订单（至少输入 {} 个字符）",
                state.config.search.min_query_len
            );
            continue;
        }

        let mut items: Vec<String> = results
            .iter()
            .map(|o| format!("{} {}", o.order_code, o.customer_name()))
            .collect();
        items.push("重新搜索".to_string());
        let choice = Select::new()
            .with_prompt("选择订单")
            .items(&items)
            .default(0)
            .interact()
            .map_err(interaction_err)?;

        if let Some(order) = results.get(choice) {
            session.bind(entry_id, order)?;
            return Ok(());
        }
    }
}

fn confirm(prompt: &str) -> AppResult<bool> {
    Confirm::new()
        .with_prompt(prompt)
        .default(true)
        .interact()
        .map_err(interaction_err)
}

fn interaction_err(err: dialoguer::Error) -> AppError {
    AppError::Business(format!("终端交互失败: {}", err))
}
