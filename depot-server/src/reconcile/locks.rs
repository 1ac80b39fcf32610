//! 按资源键控的异步互斥锁
//!
//! 核对引擎用它串行化同一硬件编号/同一结构上的并发修改，
//! 配合数据库侧的条件更新关闭 read-modify-write 竞争。

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed async mutexes for hardware numbers and structure POs
///
/// 锁获取的全局顺序：硬件锁按编号升序，结构锁最后。
/// 所有调用方遵循该顺序即不会死锁。
#[derive(Debug, Default)]
pub struct KeyedLocks {
    hardware: DashMap<String, Arc<Mutex<()>>>,
    structures: DashMap<String, Arc<Mutex<()>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn acquire(map: &DashMap<String, Arc<Mutex<()>>>, key: &str) -> Arc<Mutex<()>> {
        map.entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 锁定一个硬件编号 (已规范化)
    pub async fn lock_hardware(&self, number: &str) -> OwnedMutexGuard<()> {
        Self::acquire(&self.hardware, number).lock_owned().await
    }

    /// 按升序锁定一组硬件编号
    ///
    /// 调用方传入已排序去重的编号集合 (BTreeMap/BTreeSet 的 key 迭代
    /// 天然满足)。
    pub async fn lock_hardware_set<'a, I>(&self, numbers: I) -> Vec<OwnedMutexGuard<()>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut guards = Vec::new();
        for number in numbers {
            guards.push(self.lock_hardware(number).await);
        }
        guards
    }

    /// 锁定一个结构 PO
    pub async fn lock_structure(&self, structure_po: &str) -> OwnedMutexGuard<()> {
        Self::acquire(&self.structures, structure_po).lock_owned().await
    }
}
