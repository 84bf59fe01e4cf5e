//! 置换表
//!
//! 用于缓存已搜索过的局面，避免重复计算。
//! 固定容量，按哈希取模定位槽位，槽位冲突时按替换策略决定是否覆盖。

use std::sync::atomic::{AtomicU64, Ordering};

use rules::ChessMove;
use serde::{Deserialize, Serialize};

/// 置换表条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryType {
    /// 精确值
    Exact,
    /// 下界（Beta 截断）
    LowerBound,
    /// 上界（所有走法都没有超过 Alpha）
    UpperBound,
}

/// 槽位冲突时的替换策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Replacement {
    /// 总是覆盖
    Always,
    /// 深度优先：同一局面、旧搜索留下的条目或深度不低于原条目时覆盖
    #[default]
    DepthPreferred,
}

/// 置换表条目
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TTEntry {
    /// 完整的 Zobrist 哈希
    pub key: u64,
    /// 评估分数（走子方视角）
    pub score: i32,
    /// 搜索深度
    pub depth: u8,
    /// 条目类型
    pub entry_type: EntryType,
    /// 最佳走法
    pub best_move: Option<ChessMove>,
    /// 年龄（用于替换策略）
    pub age: u8,
}

/// 置换表
pub struct TranspositionTable {
    /// 条目数组
    entries: Vec<Option<TTEntry>>,
    /// 表大小（条目数）
    size: usize,
    replacement: Replacement,
    /// 当前年龄
    age: u8,
    /// 命中次数
    hits: AtomicU64,
    /// 查询次数
    probes: AtomicU64,
}

impl TranspositionTable {
    /// 创建指定大小的置换表
    ///
    /// # Arguments
    /// * `size_mb` - 表大小（MB）
    pub fn new(size_mb: usize, replacement: Replacement) -> Self {
        let entry_size = std::mem::size_of::<Option<TTEntry>>();
        Self::with_entries(size_mb.saturating_mul(1024 * 1024) / entry_size, replacement)
    }

    /// 创建指定条目数的置换表，至少一个槽位
    pub fn with_entries(size: usize, replacement: Replacement) -> Self {
        let size = size.max(1);
        Self {
            entries: vec![None; size],
            size,
            replacement,
            age: 0,
            hits: AtomicU64::new(0),
            probes: AtomicU64::new(0),
        }
    }

    /// 计算索引
    #[inline]
    fn index(&self, hash: u64) -> usize {
        (hash % self.size as u64) as usize
    }

    /// 查询条目，只返回哈希完全一致的条目
    pub fn probe(&self, hash: u64) -> Option<&TTEntry> {
        self.probes.fetch_add(1, Ordering::Relaxed);

        match self.entries[self.index(hash)] {
            Some(ref entry) if entry.key == hash => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            _ => None,
        }
    }

    /// 存储条目
    pub fn store(
        &mut self,
        hash: u64,
        score: i32,
        depth: u8,
        entry_type: EntryType,
        best_move: Option<ChessMove>,
    ) {
        let index = self.index(hash);
        let age = self.age;

        let should_replace = match (&self.entries[index], self.replacement) {
            (None, _) | (_, Replacement::Always) => true,
            (Some(existing), Replacement::DepthPreferred) => {
                existing.key == hash || existing.age != age || depth >= existing.depth
            }
        };

        if should_replace {
            self.entries[index] = Some(TTEntry {
                key: hash,
                score,
                depth,
                entry_type,
                best_move,
                age,
            });
        }
    }

    /// 增加年龄（每次新搜索时调用）
    pub fn new_search(&mut self) {
        self.age = self.age.wrapping_add(1);
    }

    /// 清空表
    pub fn clear(&mut self) {
        self.entries.fill(None);
        self.age = 0;
        self.hits.store(0, Ordering::Relaxed);
        self.probes.store(0, Ordering::Relaxed);
    }

    /// 表大小（条目数）
    pub fn capacity(&self) -> usize {
        self.size
    }

    /// 获取命中率
    pub fn hit_rate(&self) -> f64 {
        self.stats().hit_rate()
    }

    /// 获取使用率
    pub fn usage(&self) -> f64 {
        self.stats().usage()
    }

    /// 获取统计信息
    pub fn stats(&self) -> TTStats {
        TTStats {
            size_mb: (self.size * std::mem::size_of::<Option<TTEntry>>()) / (1024 * 1024),
            entries: self.size,
            used: self.entries.iter().filter(|e| e.is_some()).count(),
            hits: self.hits.load(Ordering::Relaxed),
            probes: self.probes.load(Ordering::Relaxed),
        }
    }
}

/// 置换表统计信息
#[derive(Debug, Clone, Serialize)]
pub struct TTStats {
    pub size_mb: usize,
    pub entries: usize,
    pub used: usize,
    pub hits: u64,
    pub probes: u64,
}

impl TTStats {
    pub fn hit_rate(&self) -> f64 {
        if self.probes == 0 {
            0.0
        } else {
            self.hits as f64 / self.probes as f64
        }
    }

    pub fn usage(&self) -> f64 {
        self.used as f64 / self.entries as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules::Square;

    fn e2e4() -> ChessMove {
        ChessMove::new(Square::E2, Square::E4, None)
    }

    #[test]
    fn test_tt_store_and_probe() {
        let mut tt = TranspositionTable::new(1, Replacement::DepthPreferred);

        let hash = 0x1234567890ABCDEF_u64;
        tt.store(hash, 100, 5, EntryType::Exact, Some(e2e4()));

        let entry = tt.probe(hash).unwrap();
        assert_eq!(entry.score, 100);
        assert_eq!(entry.depth, 5);
        assert_eq!(entry.entry_type, EntryType::Exact);
        assert_eq!(entry.best_move, Some(e2e4()));
    }

    #[test]
    fn test_tt_miss() {
        let tt = TranspositionTable::new(1, Replacement::DepthPreferred);
        assert!(tt.probe(0x1234567890ABCDEF).is_none());
        assert_eq!(tt.stats().probes, 1);
        assert_eq!(tt.stats().hits, 0);
    }

    #[test]
    fn test_same_key_overwrites() {
        let mut tt = TranspositionTable::new(1, Replacement::DepthPreferred);
        let hash = 0x1234567890ABCDEF_u64;

        tt.store(hash, 50, 3, EntryType::Exact, None);
        tt.store(hash, 100, 5, EntryType::LowerBound, None);
        assert_eq!(tt.probe(hash).unwrap().depth, 5);

        // 同一局面的新结果即使更浅也覆盖
        tt.store(hash, -20, 1, EntryType::UpperBound, None);
        let entry = tt.probe(hash).unwrap();
        assert_eq!(entry.depth, 1);
        assert_eq!(entry.score, -20);
    }

    #[test]
    fn test_collision_depth_preferred() {
        let mut tt = TranspositionTable::with_entries(4, Replacement::DepthPreferred);
        let a = 1_u64;
        let b = 5_u64; // 与 a 同槽

        tt.store(a, 10, 6, EntryType::Exact, None);
        tt.store(b, 20, 2, EntryType::Exact, None);
        assert!(tt.probe(b).is_none(), "更浅的条目不应覆盖");
        assert_eq!(tt.probe(a).unwrap().score, 10);

        // 新一轮搜索后，旧条目可被覆盖
        tt.new_search();
        tt.store(b, 20, 2, EntryType::Exact, None);
        assert!(tt.probe(a).is_none());
        assert_eq!(tt.probe(b).unwrap().score, 20);
    }

    #[test]
    fn test_collision_always_replace() {
        let mut tt = TranspositionTable::with_entries(4, Replacement::Always);
        tt.store(1, 10, 6, EntryType::Exact, None);
        tt.store(5, 20, 1, EntryType::Exact, None);
        assert!(tt.probe(1).is_none());
        assert_eq!(tt.probe(5).unwrap().score, 20);
    }

    #[test]
    fn test_clear_and_stats() {
        let mut tt = TranspositionTable::with_entries(16, Replacement::DepthPreferred);
        for hash in 0..8u64 {
            tt.store(hash, 0, 1, EntryType::Exact, None);
        }
        assert!(tt.probe(3).is_some());
        assert!(tt.probe(100).is_none());

        let stats = tt.stats();
        assert_eq!(stats.used, 8);
        assert_eq!(stats.entries, 16);
        assert!((stats.usage() - 0.5).abs() < f64::EPSILON);
        assert!((tt.hit_rate() - 0.5).abs() < f64::EPSILON);

        tt.clear();
        assert_eq!(tt.stats().used, 0);
        assert!(tt.probe(3).is_none());
    }

    #[test]
    fn test_zero_size_table() {
        let mut tt = TranspositionTable::with_entries(0, Replacement::Always);
        assert_eq!(tt.capacity(), 1);
        tt.store(42, 7, 1, EntryType::Exact, None);
        assert_eq!(tt.probe(42).unwrap().score, 7);
    }
}
