mod edge_case_tests;

/// Route `log` output through the test harness. Safe to call from every test.
/// 将 `log` 输出接入测试框架，可在每个测试中重复调用。
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
