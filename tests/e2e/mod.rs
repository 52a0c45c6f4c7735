//! 端到端测试模块
//!
//! 测试完整的业务流程和场景
