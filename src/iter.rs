//! Итераторы по словарю: safe (терпит мутации) и unsafe (ловит их).
//!
//! Оба варианта — отсоединённые курсоры: они не держат ссылок внутрь
//! словаря между вызовами `next`, только индексы (таблица, бакет,
//! позиция в цепочке). Поэтому между шагами обхода словарь можно
//! передавать по изменяемой ссылке.
//!
//! - **Safe-итератор** на первом `next` увеличивает счётчик живых
//!   итераторов словаря, чем подавляет попутные шаги рехеширования;
//!   после этого словарь можно менять, включая удаление как выданных,
//!   так и ещё не выданных записей. Записи, добавленные во время обхода,
//!   могут быть пропущены.
//! - **Unsafe-итератор** ничего не подавляет, но на первом `next`
//!   снимает отпечаток словаря и сверяет его при освобождении: любое
//!   изменение словаря за время обхода — фатальная ошибка контракта.

use crate::{
    dict::Dict,
    table::Entry,
    types::{DictType, DictValue},
};

/// Unsafe-итератор: мутации словаря во время обхода запрещены и
/// обнаруживаются по отпечатку при `release_iterator`.
pub struct DictIterator {
    table: usize,
    bucket: usize,
    chain_pos: usize,
    fingerprint: Option<u64>,
}

/// Safe-итератор: словарь можно менять между вызовами `next`, включая
/// удаление любой записи текущей цепочки.
pub struct SafeDictIterator {
    started: bool,
    table: usize,
    bucket: usize,
    chain_pos: usize,
    /// Адрес последней выданной записи: по нему курсор переякоривается
    /// после произвольных вставок и удалений в цепочке.
    last_addr: Option<usize>,
    /// Длина цепочки на момент последней выдачи — запасная компенсация
    /// на случай, когда сама выданная запись удалена.
    chain_len: Option<usize>,
}

impl DictIterator {
    fn new() -> Self {
        DictIterator {
            table: 0,
            bucket: 0,
            chain_pos: 0,
            fingerprint: None,
        }
    }

    /// Следующая запись или `None` — навсегда — после исчерпания таблиц.
    pub fn next<'a, T: DictType>(
        &mut self,
        dict: &'a Dict<T>,
    ) -> Option<(&'a T::Key, &'a DictValue<T::Val>)> {
        if self.fingerprint.is_none() {
            self.fingerprint = Some(dict.fingerprint());
        }

        loop {
            if self.table > 1 {
                return None;
            }
            let ht = &dict.ht[self.table];
            if self.bucket >= ht.size() {
                if self.table == 0 && dict.is_rehashing() {
                    self.table = 1;
                    self.bucket = 0;
                    self.chain_pos = 0;
                    continue;
                }
                self.table = 2;
                return None;
            }

            let mut cur = ht.buckets[self.bucket].as_deref();
            let mut pos = self.chain_pos;
            while pos > 0 {
                cur = cur.and_then(|e| e.next.as_deref());
                pos -= 1;
            }

            match cur {
                Some(e) => {
                    self.chain_pos += 1;
                    return Some((&e.key, &e.val));
                }
                None => {
                    self.bucket += 1;
                    self.chain_pos = 0;
                }
            }
        }
    }
}

impl SafeDictIterator {
    fn new() -> Self {
        SafeDictIterator {
            started: false,
            table: 0,
            bucket: 0,
            chain_pos: 0,
            last_addr: None,
            chain_len: None,
        }
    }

    /// Следующая запись. Первый вызов регистрирует итератор в словаре.
    pub fn next<'a, T: DictType>(
        &mut self,
        dict: &'a mut Dict<T>,
    ) -> Option<(&'a T::Key, &'a DictValue<T::Val>)> {
        if !self.started {
            self.started = true;
            dict.iterators += 1;
        }

        loop {
            if self.table > 1 {
                return None;
            }
            let rehashing = dict.is_rehashing();
            let ht = &dict.ht[self.table];
            if self.bucket >= ht.size() {
                if self.table == 0 && rehashing {
                    self.table = 1;
                    self.bucket = 0;
                    self.chain_pos = 0;
                    self.last_addr = None;
                    self.chain_len = None;
                    continue;
                }
                self.table = 2;
                return None;
            }

            // Компенсация мутаций цепочки с прошлого вызова. Основной
            // путь — переякоривание: находим последнюю выданную запись
            // по адресу и продолжаем сразу за ней, где бы она теперь ни
            // стояла. Если её удалили, остаётся компенсация по длине:
            // усадка цепочки сдвигает хвост к началу, вставка в голову —
            // от начала.
            let len_now = ht.chain_len(self.bucket);
            if let Some(addr) = self.last_addr.take() {
                let mut anchored = None;
                let mut i = 0;
                let mut cur = ht.buckets[self.bucket].as_deref();
                while let Some(e) = cur {
                    if e as *const Entry<T::Key, T::Val> as usize == addr {
                        anchored = Some(i);
                        break;
                    }
                    i += 1;
                    cur = e.next.as_deref();
                }

                match (anchored, self.chain_len.take()) {
                    (Some(i), _) => self.chain_pos = i + 1,
                    (None, Some(len_then)) => {
                        if len_now < len_then {
                            self.chain_pos = self.chain_pos.saturating_sub(len_then - len_now);
                        } else {
                            self.chain_pos += len_now - len_then;
                        }
                    }
                    (None, None) => {}
                }
            }

            let mut cur = ht.buckets[self.bucket].as_deref();
            let mut pos = self.chain_pos;
            while pos > 0 {
                cur = cur.and_then(|e| e.next.as_deref());
                pos -= 1;
            }

            match cur {
                Some(e) => {
                    self.chain_pos += 1;
                    self.last_addr = Some(e as *const Entry<T::Key, T::Val> as usize);
                    self.chain_len = Some(len_now);
                    return Some((&e.key, &e.val));
                }
                None => {
                    self.bucket += 1;
                    self.chain_pos = 0;
                    self.last_addr = None;
                    self.chain_len = None;
                }
            }
        }
    }
}

impl<T: DictType> Dict<T> {
    /// Unsafe-итератор. Пока он жив, словарь трогать нельзя.
    pub fn get_iterator(&self) -> DictIterator {
        DictIterator::new()
    }

    /// Safe-итератор: допускает мутации словаря во время обхода.
    pub fn get_safe_iterator(&self) -> SafeDictIterator {
        SafeDictIterator::new()
    }

    /// Освобождает unsafe-итератор, сверяя отпечаток словаря.
    ///
    /// # Panics
    ///
    /// Если словарь менялся за время жизни итератора: инвариантам обхода
    /// больше нельзя доверять, продолжать работу молча опасно.
    pub fn release_iterator(&self, iter: DictIterator) {
        if let Some(fp) = iter.fingerprint {
            assert!(
                fp == self.fingerprint(),
                "dict was mutated while an unsafe iterator was live"
            );
        }
    }

    /// Освобождает safe-итератор, снимая подавление рехеширования.
    pub fn release_safe_iterator(&mut self, iter: SafeDictIterator) {
        if iter.started {
            debug_assert!(self.iterators > 0);
            self.iterators -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dict::SipDict;

    #[test]
    fn plain_iteration_sees_everything_once() {
        let mut d: SipDict<u64, u64> = SipDict::default();
        for i in 0..100 {
            d.add(i, DictValue::UnsignedInt(i)).unwrap();
        }

        let mut it = d.get_iterator();
        let mut seen = Vec::new();
        while let Some((k, _)) = it.next(&d) {
            seen.push(*k);
        }
        d.release_iterator(it);

        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn iterator_stays_exhausted() {
        let mut d: SipDict<u64, u64> = SipDict::default();
        d.add(1, DictValue::UnsignedInt(1)).unwrap();

        let mut it = d.get_iterator();
        assert!(it.next(&d).is_some());
        assert!(it.next(&d).is_none());
        assert!(it.next(&d).is_none());
        d.release_iterator(it);
    }

    #[test]
    fn empty_dict_iterates_nothing() {
        let d: SipDict<u64, u64> = SipDict::default();
        let mut it = d.get_iterator();
        assert!(it.next(&d).is_none());
        d.release_iterator(it);
    }

    /// Safe-итератор переживает обход, который охватывает обе таблицы.
    #[test]
    fn safe_iteration_covers_both_tables_mid_rehash() {
        let mut d: SipDict<u64, u64> = SipDict::default();
        for i in 0..64 {
            d.add(i, DictValue::UnsignedInt(i)).unwrap();
        }
        while d.rehash(100) {}
        d.expand(512).unwrap();
        d.rehash(3);
        assert!(d.is_rehashing());

        let mut it = d.get_safe_iterator();
        let mut seen = Vec::new();
        while let Some((k, _)) = it.next(&mut d) {
            seen.push(*k);
        }
        d.release_safe_iterator(it);

        seen.sort_unstable();
        assert_eq!(seen, (0..64).collect::<Vec<_>>());
    }
}
