//! Словарь (Dict) с двумя таблицами и инкрементальным рехешированием.
//!
//! Рехеширование не останавливает мир: миграция из старой таблицы в
//! новую выполняется небольшими порциями — по одному бакету как побочный
//! эффект обычных операций (`rehash_step`) либо явными вызовами
//! [`Dict::rehash`] / [`Dict::rehash_for_duration`].
//!
//! **ИНВАРИАНТЫ:**
//!
//! - Если `rehash_idx == -1`:
//!     - ht[1] не аллоцирована
//!     - все элементы находятся в ht[0]
//!
//! - Если `rehash_idx >= 0`:
//!     - рехеширование в процессе, ht[1] аллоцирована
//!     - бакеты ht[0] с индексами меньше `rehash_idx` уже пусты
//!     - `ht[0].used` монотонно убывает, `ht[1].used` растёт
//!
//! - Общее число элементов всегда равно `ht[0].used + ht[1].used`.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::{
    config::DictConfig,
    error::{DictError, DictResult},
    table::{Entry, HashTable},
    types::{DictType, DictValue, SipDictType},
};

/// Максимальный размер bucket-массива; запрос выше возвращает
/// `TableSizeOverflow`.
const MAX_TABLE_SIZE: usize = 1 << (usize::BITS - 1);

/// Словарь с ключами и значениями, описанными дескриптором `T`.
pub struct Dict<T: DictType> {
    pub(crate) ht: [HashTable<T::Key, T::Val>; 2],
    pub(crate) dict_type: T,
    /// -1 — рехеширование не идёт, иначе индекс следующего бакета ht[0].
    pub(crate) rehash_idx: isize,
    /// Число живых safe-итераторов; пока оно больше нуля, попутные шаги
    /// рехеширования подавлены.
    pub(crate) iterators: usize,
    pub(crate) config: DictConfig,
}

/// Словарь с готовым SipHash-дескриптором.
pub type SipDict<K, V> = Dict<SipDictType<K, V>>;

impl<T: DictType + Default> Default for Dict<T> {
    fn default() -> Self {
        Dict::new(T::default())
    }
}

impl<T: DictType> Dict<T> {
    /// Новый пустой словарь. Bucket-массив не аллоцируется до первой
    /// вставки.
    pub fn new(dict_type: T) -> Self {
        Self::with_config(dict_type, DictConfig::default())
    }

    pub fn with_config(dict_type: T, mut config: DictConfig) -> Self {
        config.initial_size = config.initial_size.max(2).next_power_of_two();
        Dict {
            ht: [HashTable::unallocated(), HashTable::unallocated()],
            dict_type,
            rehash_idx: -1,
            iterators: 0,
            config,
        }
    }

    /// Словарь с заранее аллоцированной таблицей под `cap` элементов.
    pub fn with_capacity(dict_type: T, cap: usize) -> Self {
        let mut d = Self::new(dict_type);
        if cap > 0 {
            // единственная возможная ошибка здесь — переполнение запроса
            d.expand(cap).ok();
        }
        d
    }

    /// Общее число элементов в обеих таблицах.
    #[inline]
    pub fn len(&self) -> usize {
        self.ht[0].used + self.ht[1].used
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Суммарное число бакетов в обеих таблицах (`dictSlots`).
    #[inline]
    pub fn slots(&self) -> usize {
        self.ht[0].size() + self.ht[1].size()
    }

    #[inline]
    pub fn is_rehashing(&self) -> bool {
        self.rehash_idx != -1
    }

    /// Разрешает плановый resize.
    pub fn enable_resize(&mut self) {
        self.config.resize_enabled = true;
    }

    /// Запрещает плановый resize. Рост всё равно произойдёт, если
    /// `used / size` превысит `force_resize_ratio`.
    pub fn disable_resize(&mut self) {
        self.config.resize_enabled = false;
    }

    /// Задаёт затравку хеш-функции. Менять её на непустом словаре
    /// бессмысленно: уже размещённые ключи перестанут находиться.
    pub fn set_hash_function_seed(&mut self, seed: u64) {
        self.config.hash_seed = seed;
    }

    pub fn hash_function_seed(&self) -> u64 {
        self.config.hash_seed
    }

    #[inline]
    pub(crate) fn hash_key(&self, key: &T::Key) -> u64 {
        self.dict_type.hash(self.config.hash_seed, key)
    }

    ////////////////////////////////////////////////////////////////////////////
    // Resize и политика роста
    ////////////////////////////////////////////////////////////////////////////

    /// Расширяет (или инициализирует) словарь до ближайшей степени двойки,
    /// вмещающей `size` элементов.
    ///
    /// Первая аллокация заполняет ht[0] напрямую; в остальных случаях
    /// новая таблица становится ht[1] и начинается миграция.
    pub fn expand(&mut self, size: usize) -> DictResult<()> {
        if self.is_rehashing() {
            return Err(DictError::RehashInProgress);
        }
        if self.ht[0].used > size {
            return Err(DictError::InvalidResizeTarget {
                target: size,
                used: self.ht[0].used,
            });
        }

        let real_size = Self::next_power(self.config.initial_size, size)
            .ok_or(DictError::TableSizeOverflow { requested: size })?;
        let new_ht = HashTable::with_capacity(real_size);

        if self.ht[0].is_unallocated() {
            // Первая инициализация — это не рехеширование.
            self.ht[0] = new_ht;
            return Ok(());
        }

        debug!(
            from = self.ht[0].size(),
            to = real_size,
            used = self.ht[0].used,
            "incremental rehash started"
        );
        self.ht[1] = new_ht;
        self.rehash_idx = 0;
        Ok(())
    }

    /// Сжимает таблицу до минимума, вмещающего текущие элементы.
    pub fn resize(&mut self) -> DictResult<()> {
        if !self.config.resize_enabled {
            return Err(DictError::ResizeDisabled);
        }
        if self.is_rehashing() {
            return Err(DictError::RehashInProgress);
        }
        let minimal = self.ht[0].used.max(self.config.initial_size);
        self.expand(minimal)
    }

    /// Ближайшая степень двойки >= `size`, не меньше `initial`.
    fn next_power(initial: usize, size: usize) -> Option<usize> {
        if size > MAX_TABLE_SIZE {
            return None;
        }
        let mut i = initial;
        while i < size {
            i = i.checked_mul(2)?;
        }
        Some(i)
    }

    /// Запускает рост, когда заполненность этого требует.
    ///
    /// При выключенном resize рост всё равно форсируется, как только
    /// `used / size` (целочисленное деление) превышает
    /// `force_resize_ratio` — это ограничивает длину цепочек.
    fn expand_if_needed(&mut self) -> DictResult<()> {
        if self.is_rehashing() {
            return Ok(());
        }
        if self.ht[0].is_unallocated() {
            return self.expand(self.config.initial_size);
        }

        let used = self.ht[0].used;
        let size = self.ht[0].size();
        if used >= size
            && (self.config.resize_enabled || used / size > self.config.force_resize_ratio)
        {
            return self.expand(used.saturating_mul(2));
        }
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////
    // Инкрементальное рехеширование
    ////////////////////////////////////////////////////////////////////////////

    /// Переносит до `n` непустых бакетов из ht[0] в ht[1].
    ///
    /// Чтобы один вызов не зависал на разреженной таблице, просмотр пустых
    /// бакетов ограничен `n * 10`. Возвращает `true`, пока миграция не
    /// завершена.
    pub fn rehash(&mut self, n: usize) -> bool {
        if !self.is_rehashing() {
            return false;
        }

        let mut n = n;
        let mut empty_visits = n.saturating_mul(10);
        while n > 0 && self.ht[0].used > 0 {
            debug_assert!((self.rehash_idx as usize) < self.ht[0].size());

            while self.ht[0].buckets[self.rehash_idx as usize].is_none() {
                self.rehash_idx += 1;
                empty_visits -= 1;
                if empty_visits == 0 {
                    return true;
                }
            }

            // Переносим всю цепочку бакета rehash_idx в ht[1].
            let idx = self.rehash_idx as usize;
            let mut entry_opt = self.ht[0].buckets[idx].take();
            while let Some(mut e) = entry_opt {
                entry_opt = e.next.take();
                let slot = (self.hash_key(&e.key) as usize) & self.ht[1].size_mask;
                e.next = self.ht[1].buckets[slot].take();
                self.ht[1].buckets[slot] = Some(e);
                self.ht[0].used -= 1;
                self.ht[1].used += 1;
            }
            self.rehash_idx += 1;
            n -= 1;
        }

        if self.ht[0].used == 0 {
            // Миграция завершена: ht[1] становится новой ht[0].
            self.ht[0] = std::mem::replace(&mut self.ht[1], HashTable::unallocated());
            self.rehash_idx = -1;
            debug!(
                size = self.ht[0].size(),
                used = self.ht[0].used,
                "incremental rehash complete"
            );
            return false;
        }
        true
    }

    /// Рехеширует порциями по 100 бакетов, пока не истечёт бюджет времени
    /// или не завершится миграция. Возвращает число перенесённых бакетов
    /// (с точностью до размера порции).
    pub fn rehash_for_duration(&mut self, budget: Duration) -> usize {
        let start = Instant::now();
        let mut migrated = 0;

        while self.rehash(100) {
            migrated += 100;
            if start.elapsed() >= budget {
                break;
            }
        }
        debug!(migrated, "timed rehash slice finished");
        migrated
    }

    /// Один попутный шаг миграции. Подавлен, пока жив хотя бы один
    /// safe-итератор: иначе перенос бакетов ломал бы его обход.
    #[inline]
    pub(crate) fn rehash_step(&mut self) {
        if self.iterators == 0 {
            self.rehash(1);
        }
    }

    ////////////////////////////////////////////////////////////////////////////
    // Add / Find / Delete / Replace
    ////////////////////////////////////////////////////////////////////////////

    /// Вставляет пару `(key, val)`. Если ключ уже есть — `DuplicateKey`,
    /// словарь при этом не меняется.
    pub fn add(&mut self, key: T::Key, val: DictValue<T::Val>) -> DictResult<()> {
        self.rehash_step();
        // Дублирование значения — только после проверки ключа, чтобы
        // отказ ничего не копировал и не уничтожал.
        let idx = self.key_index(&key)?;
        let val = self.dup_value(val);
        self.link_new_entry(idx, key, val);
        Ok(())
    }

    /// Вставляет ключ и возвращает ссылку на значение новой записи,
    /// чтобы вызывающий заполнил его сам. До заполнения значение равно
    /// `UnsignedInt(0)`.
    pub fn add_raw(&mut self, key: T::Key) -> DictResult<&mut DictValue<T::Val>> {
        self.rehash_step();
        let idx = self.key_index(&key)?;
        Ok(self.link_new_entry(idx, key, DictValue::UnsignedInt(0)))
    }

    /// Вставляет либо обновляет. `Ok(true)` — ключа не было, `Ok(false)` —
    /// значение существующей записи заменено.
    ///
    /// При обновлении новое значение записывается до уничтожения старого:
    /// старое и новое могут ссылаться на один объект (семантика счётчика
    /// ссылок), и обратный порядок освободил бы его раньше времени.
    pub fn replace(&mut self, key: T::Key, val: DictValue<T::Val>) -> DictResult<bool> {
        self.rehash_step();

        match self.key_index(&key) {
            Ok(idx) => {
                let val = self.dup_value(val);
                self.link_new_entry(idx, key, val);
                Ok(true)
            }
            Err(DictError::DuplicateKey) => {
                let val = self.dup_value(val);
                let slot = self
                    .find_value_mut(&key)
                    .unwrap_or_else(|| unreachable!("key_index reported an existing key"));
                let old = std::mem::replace(slot, val);
                self.destroy_value(old);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Возвращает значение записи с ключом `key`, создавая запись при
    /// необходимости (аналог `add_raw`, который не считает дубликат
    /// ошибкой).
    pub fn replace_raw(&mut self, key: T::Key) -> DictResult<&mut DictValue<T::Val>> {
        self.rehash_step();
        match self.key_index(&key) {
            Ok(idx) => Ok(self.link_new_entry(idx, key, DictValue::UnsignedInt(0))),
            Err(DictError::DuplicateKey) => Ok(self
                .find_value_mut(&key)
                .unwrap_or_else(|| unreachable!("key_index reported an existing key"))),
            Err(e) => Err(e),
        }
    }

    /// Ищет запись. Возвращает `Some(&значение)` или `None`.
    pub fn find(&mut self, key: &T::Key) -> Option<&DictValue<T::Val>> {
        if self.ht[0].size() == 0 {
            return None;
        }
        self.rehash_step();
        self.find_value(key)
    }

    /// Ищет запись и отдаёт изменяемую ссылку на значение.
    pub fn find_mut(&mut self, key: &T::Key) -> Option<&mut DictValue<T::Val>> {
        if self.ht[0].size() == 0 {
            return None;
        }
        self.rehash_step();
        self.find_value_mut(key)
    }

    /// Значение-указатель по ключу (`dictFetchValue`). Для целочисленных
    /// вариантов возвращает `None` — у них нет внутренней ссылки.
    pub fn fetch_value(&mut self, key: &T::Key) -> Option<&T::Val> {
        self.find(key)?.as_ptr()
    }

    /// Удаляет запись, уничтожая ключ и значение через дескриптор.
    pub fn delete(&mut self, key: &T::Key) -> DictResult<()> {
        let entry = self.unlink(key).ok_or(DictError::KeyNotFound)?;
        let Entry { key, val, .. } = *entry;
        self.dict_type.destroy_key(key);
        self.destroy_value(val);
        Ok(())
    }

    /// Удаляет запись, не вызывая деструкторов: владение ключом и
    /// значением переходит вызывающему (`dictDeleteNoFree`).
    pub fn delete_no_free(&mut self, key: &T::Key) -> DictResult<(T::Key, DictValue<T::Val>)> {
        let entry = self.unlink(key).ok_or(DictError::KeyNotFound)?;
        let Entry { key, val, .. } = *entry;
        Ok((key, val))
    }

    /// Уничтожает все записи в обеих таблицах, оставляя словарь пригодным
    /// для повторного использования (`dictEmpty`).
    pub fn clear(&mut self) {
        for ti in 0..=1 {
            let buckets = std::mem::take(&mut self.ht[ti].buckets);
            for mut slot in buckets {
                while let Some(mut e) = slot {
                    slot = e.next.take();
                    let Entry { key, val, .. } = *e;
                    self.dict_type.destroy_key(key);
                    self.destroy_value(val);
                }
            }
            self.ht[ti].reset();
        }
        self.rehash_idx = -1;
    }

    ////////////////////////////////////////////////////////////////////////////
    // Внутренние помощники
    ////////////////////////////////////////////////////////////////////////////

    /// Индекс бакета, куда можно вставить `key`, либо `DuplicateKey`.
    /// Попутно запускает рост таблицы, если он требуется. Во время
    /// рехеширования индекс вычисляется по ht[1]: новые записи идут
    /// только в новую таблицу.
    fn key_index(&mut self, key: &T::Key) -> DictResult<usize> {
        self.expand_if_needed()?;

        let hash = self.hash_key(key);
        let mut idx = 0;
        for ti in 0..=1 {
            let table = &self.ht[ti];
            if table.is_unallocated() {
                continue;
            }
            idx = (hash as usize) & table.size_mask;

            let mut cur = &table.buckets[idx];
            while let Some(e) = cur {
                if self.dict_type.key_eq(&e.key, key) {
                    return Err(DictError::DuplicateKey);
                }
                cur = &e.next;
            }
            if !self.is_rehashing() {
                break;
            }
        }
        Ok(idx)
    }

    /// Вставляет новую запись в начало цепочки целевой таблицы.
    fn link_new_entry(
        &mut self,
        idx: usize,
        key: T::Key,
        val: DictValue<T::Val>,
    ) -> &mut DictValue<T::Val> {
        let ht_idx = if self.is_rehashing() { 1 } else { 0 };
        let key = self.dict_type.dup_key(&key).unwrap_or(key);

        let table = &mut self.ht[ht_idx];
        let next = table.buckets[idx].take();
        table.buckets[idx] = Some(Entry::new(key, val, next));
        table.used += 1;

        &mut table.buckets[idx]
            .as_mut()
            .unwrap_or_else(|| unreachable!("entry was linked just above"))
            .val
    }

    /// Поиск без попутного шага рехеширования: ht[0], затем ht[1], если
    /// идёт миграция. После переноса бакета ключей в старой таблице уже
    /// нет, поэтому двойная проверка и необходима, и достаточна.
    fn find_value(&self, key: &T::Key) -> Option<&DictValue<T::Val>> {
        let hash = self.hash_key(key);
        for ti in 0..=1 {
            let table = &self.ht[ti];
            if table.is_unallocated() {
                continue;
            }
            let slot = (hash as usize) & table.size_mask;

            let mut cur = &table.buckets[slot];
            while let Some(e) = cur {
                if self.dict_type.key_eq(&e.key, key) {
                    return Some(&e.val);
                }
                cur = &e.next;
            }
            if !self.is_rehashing() {
                break;
            }
        }
        None
    }

    fn find_value_mut(&mut self, key: &T::Key) -> Option<&mut DictValue<T::Val>> {
        // Сначала таблица, бакет и позиция в цепочке — неизменяемыми
        // проходами; затем один изменяемый спуск по индексу. Так ссылка
        // на значение не конфликтует с займом дескриптора.
        let (ti, slot) = self.locate(key)?;

        let mut pos = 0usize;
        let mut cur = self.ht[ti].buckets[slot].as_deref();
        while let Some(e) = cur {
            if self.dict_type.key_eq(&e.key, key) {
                break;
            }
            pos += 1;
            cur = e.next.as_deref();
        }

        let mut cur = self.ht[ti].buckets[slot].as_deref_mut();
        while pos > 0 {
            cur = cur.and_then(|e| e.next.as_deref_mut());
            pos -= 1;
        }
        cur.map(|e| &mut e.val)
    }

    /// Таблица и бакет, в которых живёт `key`.
    fn locate(&self, key: &T::Key) -> Option<(usize, usize)> {
        let hash = self.hash_key(key);
        for ti in 0..=1 {
            let table = &self.ht[ti];
            if table.is_unallocated() {
                continue;
            }
            let slot = (hash as usize) & table.size_mask;

            let mut cur = &table.buckets[slot];
            while let Some(e) = cur {
                if self.dict_type.key_eq(&e.key, key) {
                    return Some((ti, slot));
                }
                cur = &e.next;
            }
            if !self.is_rehashing() {
                break;
            }
        }
        None
    }

    /// Выцепляет запись из её цепочки, уменьшая счётчик таблицы.
    fn unlink(&mut self, key: &T::Key) -> Option<Box<Entry<T::Key, T::Val>>> {
        if self.ht[0].size() == 0 {
            return None;
        }
        self.rehash_step();

        let hash = self.hash_key(key);
        for ti in 0..=1 {
            if self.ht[ti].is_unallocated() {
                continue;
            }
            let slot = (hash as usize) & self.ht[ti].size_mask;

            let chain = self.ht[ti].buckets[slot].take();
            let (chain, removed) = Self::unlink_from_chain(&self.dict_type, chain, key);
            self.ht[ti].buckets[slot] = chain;

            if let Some(e) = removed {
                self.ht[ti].used -= 1;
                return Some(e);
            }
            if !self.is_rehashing() {
                break;
            }
        }
        None
    }

    /// Разбирает цепочку по владению: вынимает первый узел с ключом `key`.
    /// Возвращает (новая_цепочка, вынутый_узел).
    fn unlink_from_chain(
        t: &T,
        chain: Option<Box<Entry<T::Key, T::Val>>>,
        key: &T::Key,
    ) -> (
        Option<Box<Entry<T::Key, T::Val>>>,
        Option<Box<Entry<T::Key, T::Val>>>,
    ) {
        match chain {
            None => (None, None),
            Some(mut boxed) => {
                if t.key_eq(&boxed.key, key) {
                    let rest = boxed.next.take();
                    (rest, Some(boxed))
                } else {
                    let (rest, removed) = Self::unlink_from_chain(t, boxed.next.take(), key);
                    boxed.next = rest;
                    (Some(boxed), removed)
                }
            }
        }
    }

    /// Дублирует значение через дескриптор (только вариант `Ptr`).
    fn dup_value(&self, val: DictValue<T::Val>) -> DictValue<T::Val> {
        match val {
            DictValue::Ptr(v) => match self.dict_type.dup_val(&v) {
                Some(dup) => DictValue::Ptr(dup),
                None => DictValue::Ptr(v),
            },
            other => other,
        }
    }

    /// Уничтожает значение через дескриптор. Целочисленные варианты
    /// деструктора не требуют.
    pub(crate) fn destroy_value(&self, val: DictValue<T::Val>) {
        if let DictValue::Ptr(v) = val {
            self.dict_type.destroy_val(v);
        }
    }

    /// 64-битный отпечаток изменяемого состояния словаря: адреса
    /// bucket-массивов, размеры и счётчики обеих таблиц, перемешанные
    /// порядкочувствительно. Любая мутация между двумя снятиями
    /// отпечатка меняет его значение.
    pub(crate) fn fingerprint(&self) -> u64 {
        let integers = [
            self.ht[0].buckets.as_ptr() as usize as u64,
            self.ht[0].size() as u64,
            self.ht[0].used as u64,
            self.ht[1].buckets.as_ptr() as usize as u64,
            self.ht[1].size() as u64,
            self.ht[1].used as u64,
        ];

        let mut hash: u64 = 0;
        for n in integers {
            hash = hash.wrapping_add(n);
            // 64-битный integer mix Томаса Ванга.
            hash = (!hash).wrapping_add(hash << 21);
            hash ^= hash >> 24;
            hash = hash.wrapping_add(hash << 3).wrapping_add(hash << 8);
            hash ^= hash >> 14;
            hash = hash.wrapping_add(hash << 2).wrapping_add(hash << 4);
            hash ^= hash >> 28;
            hash = hash.wrapping_add(hash << 31);
        }
        hash
    }
}

impl<T: DictType> Drop for Dict<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dict() -> SipDict<&'static str, i32> {
        SipDict::default()
    }

    /// Проверяет базовые операции вставки и получения значений по ключу.
    #[test]
    fn basic_add_find() {
        let mut d = dict();
        d.add("a", DictValue::Ptr(1)).unwrap();
        d.add("b", DictValue::Ptr(2)).unwrap();
        assert_eq!(d.find(&"a"), Some(&DictValue::Ptr(1)));
        assert_eq!(d.find(&"b"), Some(&DictValue::Ptr(2)));
        assert_eq!(d.find(&"c"), None);
    }

    /// Повторная вставка существующего ключа — ошибка без изменения словаря.
    #[test]
    fn add_duplicate_fails() {
        let mut d = dict();
        d.add("key", DictValue::Ptr(42)).unwrap();
        assert_eq!(d.add("key", DictValue::Ptr(100)), Err(DictError::DuplicateKey));
        assert_eq!(d.find(&"key"), Some(&DictValue::Ptr(42)));
        assert_eq!(d.len(), 1);
    }

    /// `replace` обновляет существующую запись и сообщает об этом.
    #[test]
    fn replace_updates_existing_key() {
        let mut d = dict();
        assert_eq!(d.replace("key", DictValue::Ptr(42)), Ok(true));
        assert_eq!(d.replace("key", DictValue::Ptr(100)), Ok(false));
        assert_eq!(d.find(&"key"), Some(&DictValue::Ptr(100)));
    }

    /// Проверяет удаление: запись исчезает, повторное удаление — промах.
    #[test]
    fn removal() {
        let mut d = dict();
        d.add("x", DictValue::Ptr(100)).unwrap();
        assert!(d.delete(&"x").is_ok());
        assert_eq!(d.find(&"x"), None);
        assert_eq!(d.delete(&"x"), Err(DictError::KeyNotFound));
    }

    /// Большое число вставок с неизбежными рехешированиями.
    #[test]
    fn rehash_behavior() {
        let mut d: SipDict<u64, u64> = SipDict::default();
        for i in 0..1000 {
            d.add(i, DictValue::UnsignedInt(i * 10)).unwrap();
        }
        for i in 0..1000 {
            assert_eq!(d.find(&i), Some(&DictValue::UnsignedInt(i * 10)));
        }
        assert_eq!(d.len(), 1000);
    }

    /// Явное рехеширование доводит миграцию до конца.
    #[test]
    fn explicit_rehash_runs_to_completion() {
        let mut d: SipDict<u64, u64> = SipDict::default();
        for i in 0..64 {
            d.add(i, DictValue::UnsignedInt(i)).unwrap();
        }
        while d.rehash(100) {}
        d.expand(512).unwrap();
        assert!(d.is_rehashing());
        while d.rehash(1) {}
        assert!(!d.is_rehashing());
        assert_eq!(d.len(), 64);
        for i in 0..64 {
            assert_eq!(d.find(&i), Some(&DictValue::UnsignedInt(i)));
        }
    }

    /// `expand` во время миграции и ниже занятости — ошибки предусловий.
    #[test]
    fn invalid_resize_requests() {
        let mut d: SipDict<u64, u64> = SipDict::default();
        for i in 0..16 {
            d.add(i, DictValue::UnsignedInt(i)).unwrap();
        }
        while d.rehash(100) {}
        d.expand(256).unwrap();
        assert_eq!(d.expand(1024), Err(DictError::RehashInProgress));
        while d.rehash(10) {}
        assert_eq!(
            d.expand(4),
            Err(DictError::InvalidResizeTarget { target: 4, used: 16 })
        );
    }

    /// После очистки словарь пригоден к повторному использованию.
    #[test]
    fn clear_and_reuse() {
        let mut d = dict();
        d.add("a", DictValue::Ptr(1)).unwrap();
        d.clear();
        assert_eq!(d.len(), 0);
        assert!(d.add("a", DictValue::Ptr(2)).is_ok());
        assert_eq!(d.find(&"a"), Some(&DictValue::Ptr(2)));
    }

    /// Отпечаток чувствителен к мутациям и стабилен без них.
    #[test]
    fn fingerprint_tracks_mutation() {
        let mut d = dict();
        d.add("a", DictValue::Ptr(1)).unwrap();
        let fp = d.fingerprint();
        assert_eq!(fp, d.fingerprint());
        d.add("b", DictValue::Ptr(2)).unwrap();
        assert_ne!(fp, d.fingerprint());
    }

    /// Дескриптор, складывающий все ключи в одну цепочку.
    struct Colliding;

    impl DictType for Colliding {
        type Key = u64;
        type Val = u64;

        fn hash(&self, _seed: u64, _key: &u64) -> u64 {
            42
        }

        fn key_eq(&self, a: &u64, b: &u64) -> bool {
            a == b
        }
    }

    /// `find_mut` добирается до записей в глубине длинной цепочки.
    #[test]
    fn find_mut_reaches_deep_chain_entries() {
        let mut d = Dict::new(Colliding);
        for i in 0..8 {
            d.add(i, DictValue::UnsignedInt(i)).unwrap();
        }

        for i in 0..8 {
            let v = d.find_mut(&i).unwrap();
            *v = DictValue::UnsignedInt(i + 100);
        }
        for i in 0..8 {
            assert_eq!(d.find(&i).and_then(DictValue::as_unsigned), Some(i + 100));
        }
    }

    /// Гигантская порция допустима и доводит миграцию за один вызов.
    #[test]
    fn rehash_accepts_huge_batch() {
        let mut d: SipDict<u64, u64> = SipDict::default();
        for i in 0..64 {
            d.add(i, DictValue::UnsignedInt(i)).unwrap();
        }
        while d.rehash(100) {}
        d.expand(512).unwrap();

        assert!(!d.rehash(usize::MAX));
        assert!(!d.is_rehashing());
        assert_eq!(d.len(), 64);
    }

    /// Целочисленные значения живут в записи без коробки.
    #[test]
    fn integer_values() {
        let mut d: SipDict<&str, String> = SipDict::default();
        d.add("s", DictValue::SignedInt(-7)).unwrap();
        d.add("u", DictValue::UnsignedInt(7)).unwrap();
        assert_eq!(d.find(&"s").and_then(DictValue::as_signed), Some(-7));
        assert_eq!(d.find(&"u").and_then(DictValue::as_unsigned), Some(7));
        assert_eq!(d.fetch_value(&"s"), None);
    }
}
