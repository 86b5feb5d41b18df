#[cfg(test)]
pub mod test {
    use anyhow::{anyhow, Result};
    use rand::{seq::SliceRandom, Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    use std::collections::{BTreeSet, VecDeque};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::heuristics::{Centrality, Composite, Heuristic, Mobility, OpenNeighbors};
    use crate::observer::{NullObserver, SearchObserver};
    use crate::removal::{self, best_removals, greedy_removal};
    use crate::solver::WIN_SCORE;
    use crate::*;

    // A to move; only (1, 0) wins at once, by taking B's first escape square
    // and removing the second
    const WIN_IN_ONE: [&str; 3] = [".A..", ".##.", ".B#."];

    fn set(positions: &[(usize, usize)]) -> BTreeSet<Position> {
        positions.iter().map(|&p| Position::from(p)).collect()
    }

    fn layout(
        rows: usize,
        cols: usize,
        a: Position,
        b: Position,
        removed: &[Position],
    ) -> Vec<String> {
        (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| {
                        let p = Position::new(row, col);
                        if p == a {
                            'A'
                        } else if p == b {
                            'B'
                        } else if removed.contains(&p) {
                            '#'
                        } else {
                            '.'
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Plays `turns` random full turns, stopping early at a terminal state
    fn random_playout(state: &mut GameState, rng: &mut ChaCha20Rng, turns: usize) -> Result<()> {
        for _ in 0..turns {
            let player = state.to_move();
            let target = match state.legal_moves(player).choose(rng) {
                Some(&target) => target,
                None => return Ok(()),
            };
            state.apply_move(player, target.row, target.col)?;
            let at = *state
                .legal_removals()
                .choose(rng)
                .ok_or(anyhow!("no removal after a move"))?;
            state.apply_removal(at.row, at.col)?;
        }
        Ok(())
    }

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Recorder {
        fn events(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl SearchObserver for Recorder {
        fn on_iteration(
            &mut self,
            depth: u32,
            _best: Position,
            _value: f64,
            _nodes: usize,
            _elapsed: Duration,
        ) {
            self.0.lock().unwrap().push(format!("depth {}", depth));
        }
        fn on_timeout(&mut self, depth: u32, _elapsed: Duration) {
            self.0.lock().unwrap().push(format!("timeout {}", depth));
        }
        fn on_random_fallback(&mut self, _choice: Position) {
            self.0.lock().unwrap().push("fallback".to_string());
        }
        fn on_mcts_decision(
            &mut self,
            _choice: Position,
            _iterations: u32,
            _visits: u32,
            _win_rate: f64,
        ) {
            self.0.lock().unwrap().push("mcts".to_string());
        }
    }

    struct ScriptedInput {
        moves: VecDeque<Position>,
        removals: VecDeque<Position>,
        rejections: Arc<Mutex<Vec<Position>>>,
    }

    impl InputSource for ScriptedInput {
        fn request_move(&mut self, _state: &GameState, _player: PlayerId) -> Option<Position> {
            self.moves.pop_front()
        }
        fn request_removal(&mut self, _state: &GameState, _player: PlayerId) -> Option<Position> {
            self.removals.pop_front()
        }
        fn rejected(&mut self, attempt: Position, _error: &GameError) {
            self.rejections.lock().unwrap().push(attempt);
        }
    }

    #[test]
    pub fn opening_scenario() -> Result<()> {
        let mut state = GameState::standard();
        assert_eq!(state.position(PlayerId::A), Position::new(0, 3));
        assert_eq!(state.position(PlayerId::B), Position::new(7, 2));
        assert_eq!((state.phase(), state.to_move()), (Phase::Move, PlayerId::A));

        let moves: BTreeSet<_> = state.legal_moves(PlayerId::A).into_iter().collect();
        assert_eq!(moves, set(&[(0, 2), (0, 4), (1, 2), (1, 3), (1, 4)]));

        state.apply_move(PlayerId::A, 1, 3)?;
        assert_eq!((state.phase(), state.to_move()), (Phase::Remove, PlayerId::A));

        let removals = state.legal_removals();
        assert!(!removals.contains(&Position::new(1, 3)));
        assert!(!removals.contains(&Position::new(7, 2)));
        assert!(removals.contains(&Position::new(0, 3)));
        assert_eq!(removals.len(), 8 * 6 - 2);
        Ok(())
    }

    #[test]
    pub fn standard_board_layout() {
        let state = GameState::standard();
        let text = state.to_string();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("...A.."));
        assert_eq!(lines.nth(6), Some("..B..."));
        assert_eq!(lines.next(), Some("A to move"));
    }

    #[test]
    pub fn legality_matches_brute_force() -> Result<()> {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let (rows, cols) = (DEFAULT_ROWS, DEFAULT_COLS);

        for idx in 0..rows * cols {
            let a = Position::new(idx / cols, idx % cols);
            let b = if a == Position::new(rows - 1, 0) {
                Position::new(0, cols - 1)
            } else {
                Position::new(rows - 1, 0)
            };
            let removed: Vec<Position> = (0..rows * cols)
                .map(|i| Position::new(i / cols, i % cols))
                .filter(|&p| p != a && p != b && rng.gen_bool(0.3))
                .collect();
            let state = GameState::from_layout(&layout(rows, cols, a, b, &removed), PlayerId::A)?;

            let mut expected = BTreeSet::new();
            // one past the edge on both axes to cover out-of-bounds targets
            for row in 0..=rows {
                for col in 0..=cols {
                    let target = Position::new(row, col);
                    let brute = row < rows
                        && col < cols
                        && target != b
                        && !removed.contains(&target)
                        && a.row.abs_diff(row) <= 1
                        && a.col.abs_diff(col) <= 1
                        && target != a;
                    let legal = state.is_legal_move(PlayerId::A, row, col);
                    assert_eq!(legal, brute, "{} -> {}", a, target);
                    if brute {
                        expected.insert(target);
                    }
                }
            }
            let moves: BTreeSet<_> = state.legal_moves(PlayerId::A).into_iter().collect();
            assert_eq!(moves, expected);
            assert_eq!(state.mobility(PlayerId::A), expected.len());
        }
        Ok(())
    }

    #[test]
    pub fn removal_legality() -> Result<()> {
        let state = GameState::from_layout(&["A.#", "...", "..B"], PlayerId::A)?;
        assert!(state.is_legal_removal(1, 1));
        assert!(!state.is_legal_removal(0, 0));
        assert!(!state.is_legal_removal(2, 2));
        assert!(!state.is_legal_removal(0, 2));
        assert!(!state.is_legal_removal(3, 0));
        assert_eq!(state.legal_removals().len(), 6);
        Ok(())
    }

    #[test]
    pub fn cell_state_bounds() {
        let state = GameState::standard();
        assert_eq!(state.cell_state(0, 3), Ok(CellState::Occupied(PlayerId::A)));
        assert_eq!(state.cell_state(7, 2), Ok(CellState::Occupied(PlayerId::B)));
        assert_eq!(state.cell_state(4, 4), Ok(CellState::Empty));
        assert!(matches!(
            state.cell_state(8, 0),
            Err(GameError::OutOfBounds { row: 8, col: 0, .. })
        ));
        assert!(matches!(state.cell_state(0, 6), Err(GameError::OutOfBounds { .. })));
        assert!(state.is_within_bounds(7, 5));
        assert!(!state.is_within_bounds(7, 6));
    }

    #[test]
    pub fn phase_alternation_and_invariants() -> Result<()> {
        let mut rng = ChaCha20Rng::seed_from_u64(2024);

        for _ in 0..100 {
            let mut state = GameState::standard();
            let mut removed = BTreeSet::new();

            while state.outcome().is_none() {
                let player = state.to_move();
                assert_eq!(state.phase(), Phase::Move);

                let target = *state
                    .legal_moves(player)
                    .choose(&mut rng)
                    .ok_or(anyhow!("non-terminal state without moves"))?;
                state.apply_move(player, target.row, target.col)?;
                assert_eq!((state.phase(), state.to_move()), (Phase::Remove, player));
                assert_eq!(state.position(player), target);

                let at = *state
                    .legal_removals()
                    .choose(&mut rng)
                    .ok_or(anyhow!("no removal after a move"))?;
                state.apply_removal(at.row, at.col)?;
                assert_eq!((state.phase(), state.to_move()), (Phase::Move, player.opponent()));
                removed.insert(at);

                let grid = state.grid();
                assert_eq!(grid.count(CellState::Occupied(PlayerId::A)), 1);
                assert_eq!(grid.count(CellState::Occupied(PlayerId::B)), 1);
                assert_eq!(grid.count(CellState::Removed), removed.len());
                assert_eq!(state.cells_removed(), removed.len());
                assert_eq!(state.moves_made(), removed.len());
                for &p in &removed {
                    assert_eq!(grid.cell_state(p.row, p.col)?, CellState::Removed);
                }
            }

            let loser = state.to_move();
            assert!(state.is_terminal(loser));
            match state.outcome() {
                Some(Outcome::Winner(winner)) => {
                    assert_eq!(winner, loser.opponent());
                    assert!(state.mobility(winner) > 0);
                }
                Some(Outcome::Draw) => assert_eq!(state.mobility(loser.opponent()), 0),
                None => unreachable!(),
            }
        }
        Ok(())
    }

    #[test]
    pub fn illegal_actions_leave_state_untouched() -> Result<()> {
        let mut state = GameState::standard();
        let before = state.clone();

        // not adjacent, occupied, out of bounds, same cell
        for &(row, col) in &[(3, 3), (7, 2), (9, 9), (0, 3)] {
            assert!(matches!(
                state.apply_move(PlayerId::A, row, col),
                Err(GameError::IllegalMove { player: PlayerId::A, .. })
            ));
        }
        assert!(matches!(
            state.apply_move(PlayerId::B, 6, 2),
            Err(GameError::OutOfTurn { player: PlayerId::B, to_move: PlayerId::A, .. })
        ));
        assert!(matches!(
            state.apply_removal(4, 4),
            Err(GameError::WrongPhase { expected: Phase::Remove, .. })
        ));
        assert_eq!(state, before);

        state.apply_move(PlayerId::A, 1, 3)?;
        let before = state.clone();
        assert!(matches!(state.apply_removal(1, 3), Err(GameError::IllegalRemoval { .. })));
        assert!(matches!(state.apply_removal(7, 2), Err(GameError::IllegalRemoval { .. })));
        assert!(matches!(state.apply_removal(8, 0), Err(GameError::IllegalRemoval { .. })));
        assert!(matches!(
            state.apply_move(PlayerId::A, 2, 3),
            Err(GameError::WrongPhase { expected: Phase::Move, actual: Phase::Remove, .. })
        ));
        // the other player is still out of turn in the Remove phase
        assert!(matches!(
            state.apply_move(PlayerId::B, 6, 2),
            Err(GameError::OutOfTurn { player: PlayerId::B, .. })
        ));
        assert_eq!(state, before);

        state.apply_removal(4, 4)?;
        assert!(matches!(state.apply_removal(4, 4), Err(GameError::WrongPhase { .. })));
        Ok(())
    }

    #[test]
    pub fn terminal_detection() -> Result<()> {
        let surrounded = [
            "......", "......", "......", "..###.", "..#A#.", "..###.", "......", "B.....",
        ];
        let state = GameState::from_layout(&surrounded, PlayerId::A)?;
        assert!(state.is_terminal(PlayerId::A));
        assert!(!state.is_terminal(PlayerId::B));
        assert_eq!(state.outcome(), Some(Outcome::Winner(PlayerId::B)));
        assert_eq!(state.winner(), Some(PlayerId::B));

        // reverting any single neighbour frees the player
        for (row, line) in surrounded.iter().enumerate().skip(3).take(3) {
            for (col, symbol) in line.chars().enumerate() {
                if symbol != '#' {
                    continue;
                }
                let mut freed: Vec<String> = surrounded.iter().map(|s| s.to_string()).collect();
                freed[row].replace_range(col..col + 1, ".");
                let state = GameState::from_layout(&freed, PlayerId::A)?;
                assert!(!state.is_terminal(PlayerId::A));
                assert_eq!(state.outcome(), None);
            }
        }

        // only B's turn makes B's isolation terminal
        let state = GameState::from_layout(&surrounded, PlayerId::B)?;
        assert!(!state.is_terminal(PlayerId::A));
        assert_eq!(state.outcome(), None);

        // off-board neighbours count as blocked
        let corner = GameState::from_layout(&["A#..", "##..", "...B"], PlayerId::A)?;
        assert!(corner.is_terminal(PlayerId::A));
        Ok(())
    }

    #[test]
    pub fn both_players_stuck_is_a_draw() -> Result<()> {
        let state = GameState::from_layout(&["A#B", "###"], PlayerId::B)?;
        assert!(state.is_terminal(PlayerId::B));
        assert_eq!(state.outcome(), Some(Outcome::Draw));
        assert_eq!(state.winner(), None);
        Ok(())
    }

    #[test]
    pub fn layout_errors() {
        assert!(GameState::from_layout(&["A.", "B"], PlayerId::A).is_err());
        assert!(GameState::from_layout(&["AA", "B."], PlayerId::A).is_err());
        assert!(GameState::from_layout(&["A.", ".."], PlayerId::A).is_err());
        assert!(GameState::from_layout(&["A?", ".B"], PlayerId::A).is_err());
        assert!(GameState::from_layout::<&str>(&[], PlayerId::A).is_err());
        assert!(matches!(GameState::new(1, 6), Err(GameError::InvalidDimensions { .. })));
        assert!(GameState::new(3, 3).is_ok());
    }

    #[test]
    pub fn make_and_undo_restore_the_state() -> Result<()> {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        let mut state = GameState::standard();
        random_playout(&mut state, &mut rng, 6)?;

        let before = state.clone();
        for target in state.legal_moves(state.to_move()) {
            let undo = removal::play_turn(&mut state, target);
            assert_eq!(state.phase(), Phase::Move);
            assert_eq!(state.to_move(), before.to_move().opponent());
            removal::undo_turn(&mut state, undo);
            assert_eq!(state, before);
        }
        Ok(())
    }

    #[test]
    pub fn heuristics() -> Result<()> {
        let state = GameState::from_layout(&["....", ".A..", "....", "#B#."], PlayerId::A)?;
        assert_eq!(Mobility.evaluate(&state, PlayerId::A), 8.0 - 3.0);
        assert_eq!(Mobility.evaluate(&state, PlayerId::B), -5.0);
        assert_eq!(OpenNeighbors.evaluate(&state, PlayerId::A), 8.0);
        assert_eq!(OpenNeighbors.evaluate(&state, PlayerId::B), 3.0);

        // centre of a 4x4 board is (1.5, 1.5)
        assert_eq!(Centrality.evaluate(&state, PlayerId::A), 0.5);
        assert_eq!(Centrality.evaluate(&state, PlayerId::B), 1.0 / 3.0);

        let composite = Composite::new(HeuristicWeights {
            mobility: 2.0,
            centrality: 4.0,
            open_neighbors: 0.5,
        });
        assert_eq!(composite.evaluate(&state, PlayerId::A), 2.0 * 5.0 + 4.0 * 0.5 + 0.5 * 8.0);

        let mobility_only = Composite::new(HeuristicWeights::mobility_only());
        assert_eq!(mobility_only.evaluate(&state, PlayerId::A), 5.0);

        // deterministic
        let score = composite.evaluate(&state, PlayerId::B);
        assert_eq!(composite.evaluate(&state, PlayerId::B), score);
        Ok(())
    }

    #[test]
    pub fn removal_ranking() -> Result<()> {
        let mut state = GameState::from_layout(&WIN_IN_ONE, PlayerId::A)?;

        state.apply_move(PlayerId::A, 0, 0)?;
        // (1, 0) and (2, 0) both block B but (1, 0) also blocks A
        assert_eq!(best_removals(&state), vec![Position::new(2, 0)]);
        assert_eq!(greedy_removal(&state), Some(Position::new(2, 0)));

        let mut state = GameState::from_layout(&WIN_IN_ONE, PlayerId::A)?;
        state.apply_move(PlayerId::A, 0, 2)?;
        assert_eq!(best_removals(&state), vec![Position::new(1, 0), Position::new(2, 0)]);
        assert_eq!(greedy_removal(&state), Some(Position::new(1, 0)));
        Ok(())
    }

    #[test]
    pub fn solver_takes_the_immediate_win() -> Result<()> {
        let state = GameState::from_layout(&WIN_IN_ONE, PlayerId::A)?;
        let recorder = Recorder::default();
        let mut solver = Solver::new(SearchConfig::fixed_depth(4).with_seed(3))?
            .with_observer(Box::new(recorder.clone()));

        assert_eq!(solver.choose_move(&state)?, Position::new(1, 0));
        assert_eq!(solver.completed_depth, 1);
        assert_eq!(recorder.events(), vec!["depth 1".to_string()]);
        assert!(solver.alpha_beta_value(&state, 1)? >= WIN_SCORE);

        let mut after = state.clone();
        after.apply_move(PlayerId::A, 1, 0)?;
        assert_eq!(solver.choose_removal(&after)?, Position::new(2, 0));
        after.apply_removal(2, 0)?;
        assert_eq!(after.winner(), Some(PlayerId::A));
        Ok(())
    }

    #[test]
    pub fn alpha_beta_matches_minimax() -> Result<()> {
        let mut rng = ChaCha20Rng::seed_from_u64(99);
        let mut positions = Vec::new();
        while positions.len() < 12 {
            let mut state = GameState::new(3, 3)?;
            let turns = rng.gen_range(0..3);
            random_playout(&mut state, &mut rng, turns)?;
            if state.outcome().is_none() {
                positions.push(state);
            }
        }
        let mut state = GameState::new(4, 4)?;
        random_playout(&mut state, &mut rng, 2)?;
        if state.outcome().is_none() {
            positions.push(state);
        }

        for weights in [HeuristicWeights::default(), HeuristicWeights::mobility_only()] {
            let config = SearchConfig::fixed_depth(4).with_weights(weights).with_seed(0);
            let mut solver = Solver::new(config)?.with_observer(Box::new(NullObserver));
            for state in &positions {
                for depth in 1..=4 {
                    let pruned = solver.alpha_beta_value(state, depth)?;
                    let full = solver.minimax_value(state, depth)?;
                    assert_eq!(pruned, full, "depth {} on\n{}", depth, state);
                }
            }
        }
        Ok(())
    }

    #[test]
    pub fn search_leaves_the_live_state_alone() -> Result<()> {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let mut state = GameState::standard();
        random_playout(&mut state, &mut rng, 4)?;
        let before = state.clone();

        let mut solver = Solver::new(SearchConfig::fixed_depth(3).with_seed(1))?;
        let target = solver.choose_move(&state)?;
        assert!(state.is_legal_move(state.to_move(), target.row, target.col));
        assert!(solver.node_count > 0);

        let mut mcts = Mcts::new(MctsConfig::default().with_iterations(200).with_seed(1))?;
        let target = mcts.choose_move(&state)?;
        assert!(state.is_legal_move(state.to_move(), target.row, target.col));

        assert_eq!(state, before);
        Ok(())
    }

    #[test]
    pub fn parallel_root_search_agrees() -> Result<()> {
        let mut rng = ChaCha20Rng::seed_from_u64(31);
        for _ in 0..5 {
            let mut state = GameState::standard();
            random_playout(&mut state, &mut rng, 3)?;
            if state.outcome().is_some() {
                continue;
            }
            let config = SearchConfig::fixed_depth(3).with_seed(4);
            let sequential = Solver::new(config.clone())?.choose_move(&state)?;
            let parallel = Solver::new(config.with_parallel(true))?.choose_move(&state)?;
            assert_eq!(sequential, parallel);
        }
        Ok(())
    }

    #[test]
    pub fn exhausted_budget_falls_back_to_a_random_move() -> Result<()> {
        let state = GameState::standard();
        let recorder = Recorder::default();
        let config = SearchConfig::default()
            .with_time_budget(Some(Duration::ZERO))
            .with_seed(12);
        let mut solver = Solver::new(config)?.with_observer(Box::new(recorder.clone()));

        let target = solver.choose_move(&state)?;
        assert!(state.is_legal_move(PlayerId::A, target.row, target.col));
        assert_eq!(solver.completed_depth, 0);
        assert_eq!(recorder.events(), vec!["timeout 1".to_string(), "fallback".to_string()]);
        Ok(())
    }

    #[test]
    pub fn time_budget_is_respected() -> Result<()> {
        let state = GameState::standard();
        let config = SearchConfig::default()
            .with_max_depth(40)
            .with_time_budget_secs(0.2)
            .with_seed(2);
        let mut solver = Solver::new(config)?;

        let start = std::time::Instant::now();
        let target = solver.choose_move(&state)?;
        assert!(start.elapsed() < Duration::from_secs(2));
        assert!(state.is_legal_move(PlayerId::A, target.row, target.col));
        assert!(solver.completed_depth >= 1);
        Ok(())
    }

    #[test]
    pub fn engines_signal_terminal_states() -> Result<()> {
        let stuck = GameState::from_layout(&["A#..", "##..", "...B"], PlayerId::A)?;
        let stuck_error = GameError::NoLegalAction { player: PlayerId::A };
        let mut solver = Solver::new(SearchConfig::fixed_depth(2))?;
        assert_eq!(solver.choose_move(&stuck), Err(stuck_error.clone()));
        let mut mcts = Mcts::new(MctsConfig::default().with_iterations(10))?;
        assert_eq!(mcts.choose_move(&stuck), Err(stuck_error));

        // phase mismatch
        let state = GameState::standard();
        let wrong_phase = GameError::WrongPhase {
            to_move: PlayerId::A,
            expected: Phase::Remove,
            actual: Phase::Move,
        };
        assert_eq!(solver.choose_removal(&state), Err(wrong_phase.clone()));
        assert_eq!(mcts.choose_removal(&state), Err(wrong_phase));
        Ok(())
    }

    #[test]
    pub fn mcts_finds_the_winning_move() -> Result<()> {
        let state = GameState::from_layout(&WIN_IN_ONE, PlayerId::A)?;
        let mut correct = 0;
        for seed in 0..20 {
            let config = MctsConfig::default().with_iterations(500).with_seed(seed);
            let mut mcts = Mcts::new(config)?.with_observer(Box::new(NullObserver));
            if mcts.choose_move(&state)? == Position::new(1, 0) {
                correct += 1;
            }
        }
        assert!(correct >= 19, "winning move chosen {} times out of 20", correct);
        Ok(())
    }

    #[test]
    pub fn mcts_returns_a_proven_win_once_expanded() -> Result<()> {
        let state = GameState::from_layout(&WIN_IN_ONE, PlayerId::A)?;
        // three iterations expand all three root moves and nothing more
        for seed in 0..10 {
            let config = MctsConfig::default().with_iterations(3).with_seed(seed);
            let mut mcts = Mcts::new(config)?.with_observer(Box::new(NullObserver));
            assert_eq!(mcts.choose_move(&state)?, Position::new(1, 0));
        }

        // (0, 2) also wins, but a turn later, and never counts as proven
        let config = MctsConfig::default().with_iterations(500).with_seed(8);
        let tree = Mcts::new(config)?.search(&state)?;
        for &(action, id) in &tree.get(tree.root()).children {
            assert_eq!(tree.get(id).proven_win, action == Position::new(1, 0));
        }
        assert!(tree.node_count() > 3);
        Ok(())
    }

    #[test]
    pub fn mcts_tree_statistics() -> Result<()> {
        let state = GameState::from_layout(&WIN_IN_ONE, PlayerId::A)?;
        let config = MctsConfig::default()
            .with_iterations(300)
            .with_rollout(RolloutPolicy::Heuristic)
            .with_seed(6);
        let tree = Mcts::new(config)?.search(&state)?;

        let root = tree.get(tree.root());
        assert_eq!(root.visits, 300);
        assert!(root.is_fully_expanded());
        assert_eq!(root.children.len(), 3);
        let child_visits: u32 = root.children.iter().map(|&(_, id)| tree.get(id).visits).sum();
        assert_eq!(child_visits, 300);

        let (best, id) = tree.best_child().ok_or(anyhow!("no children"))?;
        assert_eq!(best, Position::new(1, 0));
        assert_eq!(tree.get(id).average_reward(), 1.0);
        assert_eq!(tree.get(id).player, PlayerId::A);
        assert!(tree.get(id).proven_win);
        Ok(())
    }

    #[test]
    pub fn human_input_is_validated_and_retried() -> Result<()> {
        let rejections = Arc::new(Mutex::new(Vec::new()));
        let input = ScriptedInput {
            moves: vec![Position::new(3, 3), Position::new(0, 3), Position::new(1, 4)].into(),
            removals: vec![Position::new(1, 4), Position::new(5, 5)].into(),
            rejections: rejections.clone(),
        };
        let mut player = Player::human("Alice", Box::new(input));
        assert_eq!(player.kind(), PlayerKind::Human);
        assert_eq!(player.name(), "Alice");

        let mut state = GameState::standard();
        let target = player.choose_move(&state)?;
        assert_eq!(target, Position::new(1, 4));
        state.apply_move(PlayerId::A, target.row, target.col)?;

        let at = player.choose_token_to_remove(&state)?;
        assert_eq!(at, Position::new(5, 5));
        state.apply_removal(at.row, at.col)?;

        assert_eq!(
            *rejections.lock().unwrap(),
            vec![Position::new(3, 3), Position::new(0, 3), Position::new(1, 4)]
        );

        // the script is exhausted
        let mut state = GameState::standard_with_first_player(PlayerId::B);
        assert_eq!(player.choose_move(&state), Err(GameError::InputClosed { player: PlayerId::B }));
        state.apply_move(PlayerId::B, 6, 2)?;
        assert_eq!(
            player.choose_token_to_remove(&state),
            Err(GameError::InputClosed { player: PlayerId::B })
        );
        Ok(())
    }

    #[test]
    pub fn player_factory() -> Result<()> {
        assert_eq!("Computer".parse::<PlayerKind>()?, PlayerKind::Computer);
        assert_eq!(" human ".parse::<PlayerKind>()?, PlayerKind::Human);
        assert!("robot".parse::<PlayerKind>().is_err());

        let player = Player::from_kind(PlayerKind::Computer, "CPU", EngineConfig::default(), None)?;
        assert_eq!(player.kind(), PlayerKind::Computer);
        assert_eq!(player.name(), "CPU");

        assert!(matches!(
            Player::from_kind(PlayerKind::Human, "Bob", EngineConfig::default(), None),
            Err(GameError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            Player::computer("Bad", EngineConfig::Mcts(MctsConfig::default().with_iterations(0))),
            Err(GameError::InvalidConfiguration { .. })
        ));
        Ok(())
    }

    #[test]
    pub fn game_ends_with_the_forced_win() -> Result<()> {
        let state = GameState::from_layout(&WIN_IN_ONE, PlayerId::A)?;
        let engine = |seed| EngineConfig::Minimax(SearchConfig::fixed_depth(3).with_seed(seed));
        let a = Player::computer("A", engine(1))?;
        let b = Player::computer("B", engine(2))?;
        let mut game = Game::new(state, a, b);

        assert_eq!(game.play()?, Outcome::Winner(PlayerId::A));
        assert_eq!(game.turns(), 1);
        assert_eq!(game.state().position(PlayerId::A), Position::new(1, 0));
        assert_eq!(game.player(PlayerId::A).name(), "A");
        Ok(())
    }

    #[test]
    pub fn minimax_against_mcts_plays_to_completion() -> Result<()> {
        let mut rng = ChaCha20Rng::seed_from_u64(17);
        let minimax = Player::computer(
            "minimax",
            EngineConfig::Minimax(SearchConfig::fixed_depth(2).with_seed(1)),
        )?;
        let mcts = Player::computer(
            "mcts",
            EngineConfig::Mcts(MctsConfig::default().with_iterations(100).with_seed(1)),
        )?;
        let mut game = Game::with_random_start(&mut rng, minimax, mcts);

        let outcome = game.play()?;
        let state = game.state();
        assert_eq!(state.outcome(), Some(outcome));
        assert!(game.turns() > 0);
        assert_eq!(state.cells_removed(), game.turns());
        // each turn removes one of the 46 free cells
        assert!(game.turns() <= DEFAULT_ROWS * DEFAULT_COLS - 2);
        // the game is over, so another turn reports the same result
        assert_eq!(game.play_turn()?, Some(outcome));
        Ok(())
    }

    /// Scores nothing, so no two moves ever compare
    struct Unordered;

    impl Heuristic for Unordered {
        fn evaluate(&self, _state: &GameState, _player: PlayerId) -> f64 {
            f64::NAN
        }
    }

    #[test]
    pub fn heavy_weights_never_outrank_a_win() -> Result<()> {
        let state = GameState::from_layout(&WIN_IN_ONE, PlayerId::A)?;
        for mobility in [1e7, -1e7, 1e300] {
            let weights = HeuristicWeights {
                mobility,
                centrality: 1e9,
                open_neighbors: 0.5,
            };
            let config = SearchConfig::fixed_depth(4).with_weights(weights).with_seed(5);
            let mut solver = Solver::new(config)?.with_observer(Box::new(NullObserver));

            assert_eq!(solver.choose_move(&state)?, Position::new(1, 0), "mobility {}", mobility);
            assert_eq!(solver.completed_depth, 1);

            // heuristic leaves stay strictly below a forced win
            let mut losing = state.clone();
            losing.apply_move(PlayerId::A, 0, 2)?;
            losing.apply_removal(1, 0)?;
            let value = solver.alpha_beta_value(&losing, 1)?;
            assert!(value.abs() < WIN_SCORE, "leaf scored {}", value);
        }
        Ok(())
    }

    #[test]
    pub fn engine_constructors_validate() {
        let nan_weights = HeuristicWeights {
            mobility: f64::NAN,
            ..HeuristicWeights::default()
        };
        assert!(matches!(
            Solver::new(SearchConfig::fixed_depth(2).with_weights(nan_weights)),
            Err(GameError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            Solver::new(SearchConfig::fixed_depth(0)),
            Err(GameError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            Solver::with_heuristic(SearchConfig::fixed_depth(0), Mobility),
            Err(GameError::InvalidConfiguration { .. })
        ));

        let mut config = MctsConfig::default().with_rollout(RolloutPolicy::Heuristic);
        config.weights = nan_weights;
        assert!(matches!(Mcts::new(config), Err(GameError::InvalidConfiguration { .. })));
        assert!(matches!(
            Mcts::with_heuristic(MctsConfig::default().with_exploration(-1.0), Mobility),
            Err(GameError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    pub fn heuristic_rollouts_survive_unordered_scores() -> Result<()> {
        let state = GameState::standard();
        let config = MctsConfig::default()
            .with_iterations(50)
            .with_rollout(RolloutPolicy::Heuristic)
            .with_seed(9);

        let mut mcts = Mcts::with_heuristic(config.clone(), Unordered)?;
        let target = mcts.choose_move(&state)?;
        assert!(state.is_legal_move(PlayerId::A, target.row, target.col));

        // finite weights whose terms overflow to opposite infinities
        let mut config = config;
        config.weights = HeuristicWeights {
            mobility: 1e308,
            centrality: 0.0,
            open_neighbors: -1e308,
        };
        let mut mcts = Mcts::new(config)?;
        let target = mcts.choose_move(&state)?;
        assert!(state.is_legal_move(PlayerId::A, target.row, target.col));

        let config = SearchConfig::fixed_depth(2).with_seed(9);
        let mut solver = Solver::with_heuristic(config, Unordered)?;
        let target = solver.choose_move(&state)?;
        assert!(state.is_legal_move(PlayerId::A, target.row, target.col));
        Ok(())
    }

    #[test]
    pub fn wrong_phase_names_both_phases() -> Result<()> {
        let mut state = GameState::standard();
        state.apply_move(PlayerId::A, 1, 3)?;
        let error = state
            .acting_player(Phase::Move)
            .err()
            .ok_or(anyhow!("a Remove-phase state accepted a move"))?;
        assert_eq!(
            error.to_string(),
            "expected the move phase, but player A is in the remove phase"
        );
        assert_eq!(state.acting_player(Phase::Remove), Ok(PlayerId::A));
        Ok(())
    }
}
