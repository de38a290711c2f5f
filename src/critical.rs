//! スコープ付きクリティカルセクション
//!
//! 高速パスに途中状態を見せてはならないレジスタ操作（起動時のペリフェラル
//! リセットなど）を囲みます。ガードの破棄で必ず割り込み状態が復元されます。

use core::marker::PhantomData;

/// 割り込み禁止ガード
///
/// 生成時に割り込みを禁止し、`Drop` で生成前の状態に戻す。
/// ネストした場合は最も外側のガードの破棄で割り込みが再開される。
#[must_use = "the critical section ends when the guard is dropped"]
pub struct CriticalSectionGuard {
    restore_state: critical_section::RestoreState,
    // 取得したコンテキストで解放する必要があるため Send にしない
    _not_send: PhantomData<*mut ()>,
}

impl CriticalSectionGuard {
    pub fn acquire() -> Self {
        // SAFETY: release は Drop で取得と逆順に一度だけ呼ばれる
        let restore_state = unsafe { critical_section::acquire() };
        Self {
            restore_state,
            _not_send: PhantomData,
        }
    }

    /// 既存APIに渡すためのトークン
    pub fn token(&self) -> critical_section::CriticalSection<'_> {
        // SAFETY: ガードが生きている間はクリティカルセクション内
        unsafe { critical_section::CriticalSection::new() }
    }
}

impl Drop for CriticalSectionGuard {
    fn drop(&mut self) {
        // SAFETY: acquire で得た状態をそのまま返す
        unsafe { critical_section::release(self.restore_state) };
    }
}
